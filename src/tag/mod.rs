// SPDX-License-Identifier: MPL-2.0

//! Container/tag recognition limited to length and skip: enough to keep the
//! scanner from mistaking tag bytes for MPEG sync, nothing more. Parsing
//! tag contents is explicitly out of scope.

mod id3v1;
mod id3v2;
mod riff;

pub use id3v1::detect_id3v1;
pub use id3v2::detect_id3v2;
pub use riff::detect_riff;

/// Kind of non-audio region the scanner skipped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Id3v2,
    Id3v1,
    Riff,
}

/// A recognized tag region: `offset` and total byte `length` (including any
/// marker), enough for the scanner to jump past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    pub kind: TagKind,
    pub offset: u64,
    pub length: u64,
}
