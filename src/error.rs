// SPDX-License-Identifier: MPL-2.0

//! The crate's error type.
//!
//! Mirrors the shape of `symphonia_core::errors`: one flat enum plus a
//! `Result` alias, rather than a tree of per-module error types.

use std::sync::Arc;

/// Errors reported by the MPEG bitstream reader.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ReaderError {
    /// Construction failed: fewer than two MPEG frames could be found in the source.
    #[error("not a valid MPEG audio stream")]
    NotAValidMpegStream,

    /// A read or seek targeted a byte offset before the window's discard watermark on a
    /// source that cannot be rewound.
    #[error("backward seek on a forward-only stream")]
    BackwardSeekOnForwardStream,

    /// A free-format frame's length could not be resolved because the source cannot be
    /// seeked to recover the bytes once the next sync is found.
    #[error("free-format frame requires a seekable source")]
    FreeFormatRequiresSeek,

    /// `seek_to` was called on a forward-only source.
    #[error("source does not support seeking")]
    CannotSeek,

    /// The underlying source returned an I/O error that was not end-of-file.
    #[error("source I/O error: {0}")]
    SourceIoError(Arc<std::io::Error>),

    /// The source was disposed (closed) out from under an in-progress read.
    /// Only ever surfaced by [`crate::MpegReader::next_frame`] and
    /// [`crate::MpegReader::seek_to`]; `read_to_end` swallows this variant
    /// silently and simply stops.
    #[error("source was disposed")]
    ObjectDisposed,
}

impl ReaderError {
    /// True for the sentinel `std::io::ErrorKind::Other` used by sources to
    /// signal that they were disposed mid-read.
    pub(crate) fn from_io_error(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::Other && err.to_string() == DISPOSED_SENTINEL {
            ReaderError::ObjectDisposed
        } else {
            ReaderError::SourceIoError(Arc::new(err))
        }
    }
}

/// Sentinel message a `Source` impl may use in an `ErrorKind::Other` I/O
/// error to signal it was disposed, distinguishing that case from an
/// ordinary I/O failure.
pub const DISPOSED_SENTINEL: &str = "source disposed";

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::from_io_error(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReaderError>;
