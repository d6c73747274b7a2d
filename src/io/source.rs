// SPDX-License-Identifier: MPL-2.0

//! The `Source` trait: the reader's one external collaborator boundary.
//!
//! Modeled on `symphonia_core::io::MediaSource`, but narrowed to what this
//! crate actually needs: byte-addressed `Read` + `Seek`, a seekability
//! query, and an optional total length. A non-seekable source is an
//! acceptable subset of capabilities, per spec.

use std::fs::File;
use std::io::{Cursor, Read, Seek};

/// A byte-addressable audio source. Implementors may be forward-only (seek
/// unsupported) or fully seekable.
pub trait Source: Read + Seek + Send {
    /// Returns `true` if this source supports absolute seeking.
    fn is_seekable(&self) -> bool;

    /// Returns the total length in bytes, if known without an expensive probe.
    fn byte_len(&self) -> Option<u64>;
}

impl Source for File {
    fn is_seekable(&self) -> bool {
        self.metadata().map(|m| m.is_file()).unwrap_or(false)
    }

    fn byte_len(&self) -> Option<u64> {
        self.metadata().ok().map(|m| m.len())
    }
}

impl<T: AsRef<[u8]> + Send> Source for Cursor<T> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.get_ref().as_ref().len() as u64)
    }
}

/// Wraps any `Read + Send` stream that cannot be seeked (e.g. a network
/// socket or a pipe) as a forward-only [`Source`].
pub struct ForwardOnly<R> {
    inner: R,
}

impl<R: Read + Send> ForwardOnly<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read + Send> Read for ForwardOnly<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Send> Seek for ForwardOnly<R> {
    fn seek(&mut self, _pos: std::io::SeekFrom) -> std::io::Result<u64> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "stream does not support seeking",
        ))
    }
}

impl<R: Read + Send> Source for ForwardOnly<R> {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        None
    }
}
