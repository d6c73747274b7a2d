// SPDX-License-Identifier: MPL-2.0

//! A bitstream-level reader for MPEG audio (MPEG-1/2/2.5, Layers I-III):
//! frame-accurate resync over a byte stream, VBR side-info (Xing/Info/VBRI)
//! recognition, and ID3v2/ID3v1/RIFF container skipping. Does not decode
//! audio samples; this crate answers "where are the frames and how many
//! samples do they cover", not "what do they sound like".
//!
//! The entry point is [`MpegReader`], constructed over anything implementing
//! [`Source`] (a seekable [`std::fs::File`] or [`std::io::Cursor`], or a
//! forward-only stream wrapped in [`ForwardOnly`]).

mod error;
mod frame;
mod header;
mod io;
mod options;
mod reader;
mod scanner;
mod tag;
mod vbr;

pub use error::{ReaderError, Result, DISPOSED_SENTINEL};
pub use frame::MpegFrame;
pub use header::{ChannelMode, FrameHeader, MpegLayer, MpegVersion};
pub use io::{ForwardOnly, Source};
pub use options::ReaderOptions;
pub use reader::MpegReader;
pub use tag::{TagKind, TagSpan};
pub use vbr::VbrInfo;
