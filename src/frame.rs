// SPDX-License-Identifier: MPL-2.0

//! The frame catalog: a singly-linked, append-only, numbered list of MPEG
//! frames interleaved with skipped tag spans, each carrying its cumulative
//! sample offset.
//!
//! Grounded on `symphonia_bundle_mp3::demuxer`'s frame-by-frame walk for the
//! data each frame needs to carry, restructured into a persistent, shared
//! catalog (`Arc` + `OnceLock` links) since this reader, unlike a demuxer,
//! must let multiple frames stay reachable at once for random-access seek.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::error::Result;
use crate::header::{ChannelMode, FrameHeader, MpegLayer, MpegVersion};
use crate::io::WindowBuffer;

/// One recognized MPEG audio frame. Never the silent Xing/Info/VBRI
/// side-info header some VBR encoders write as the stream's first frame —
/// the scanner recognizes and consumes that frame itself, without
/// cataloguing it (see `ScannerState::try_sync`).
pub struct MpegFrame {
    /// Ordinal position in the catalog, starting at zero.
    pub number: u64,
    /// Absolute byte offset of the frame's header.
    pub offset: u64,
    /// Frame length in bytes, including the 4-byte header. For a
    /// free-format frame this starts at `0` and is written exactly once,
    /// after the next sync is found (or end-of-stream), by the scanner.
    frame_length: AtomicU64,
    pub version: MpegVersion,
    pub layer: MpegLayer,
    pub channel_mode: ChannelMode,
    pub sample_rate: u32,
    pub bit_rate_index: u8,
    pub bit_rate: u32,
    /// PCM samples per channel produced by this frame.
    pub sample_count: u32,
    /// Cumulative sample count of all frames strictly before this one.
    pub sample_offset: u64,
    /// Populated when the scanner has captured this frame's raw bytes ahead
    /// of the window evicting them (forward-only sources only), or when a
    /// caller explicitly asks to retain them.
    save_buffer: Mutex<Option<Box<[u8]>>>,
    pub(crate) next: OnceLock<Arc<MpegFrame>>,
    window: Arc<WindowBuffer>,
}

impl MpegFrame {
    pub fn new(
        number: u64,
        offset: u64,
        header: &FrameHeader,
        sample_offset: u64,
        window: Arc<WindowBuffer>,
    ) -> Self {
        MpegFrame {
            number,
            offset,
            frame_length: AtomicU64::new(header.frame_length.unwrap_or(0) as u64),
            version: header.version,
            layer: header.layer,
            channel_mode: header.channel_mode,
            sample_rate: header.sample_rate,
            bit_rate_index: header.bit_rate_index,
            bit_rate: header.bit_rate,
            sample_count: header.sample_count(),
            sample_offset,
            save_buffer: Mutex::new(None),
            next: OnceLock::new(),
            window,
        }
    }

    pub fn is_free_format(&self) -> bool {
        self.bit_rate_index == 0
    }

    /// Frame length in bytes, including the header. `0` for a free-format
    /// frame whose length has not yet been resolved.
    pub fn frame_length(&self) -> u64 {
        self.frame_length.load(Ordering::Acquire)
    }

    pub fn is_length_resolved(&self) -> bool {
        !self.is_free_format() || self.frame_length() != 0
    }

    /// Resolves a free-format frame's length. Callers must only invoke this
    /// once, under `frame_lock`, once the next sync has been found; it is a
    /// logic error to call this on a non-free-format frame or one already
    /// resolved.
    pub(crate) fn resolve_free_format_length(&self, length: u64) {
        debug_assert!(self.is_free_format());
        debug_assert_eq!(self.frame_length.load(Ordering::Acquire), 0);
        self.frame_length.store(length, Ordering::Release);
    }

    pub fn end_offset(&self) -> u64 {
        self.offset + self.frame_length()
    }

    pub(crate) fn set_next(&self, next: Arc<MpegFrame>) {
        let _ = self.next.set(next);
    }

    pub fn next(&self) -> Option<Arc<MpegFrame>> {
        self.next.get().cloned()
    }

    /// Reads up to `dst.len()` bytes of this frame's raw bytes (header
    /// included) starting at `local_offset` bytes into the frame. Returns
    /// fewer than requested only past the frame's end.
    ///
    /// Serves from a captured [`Self::save_buffer`] when one is present;
    /// otherwise reads straight through the shared window, which only
    /// succeeds while the frame's bytes have not yet been evicted.
    pub fn read(&self, local_offset: u64, dst: &mut [u8]) -> Result<usize> {
        let len = self.frame_length();
        if local_offset >= len {
            return Ok(0);
        }
        let n = dst.len().min((len - local_offset) as usize);

        if let Some(saved) = self.save_buffer.lock().unwrap().as_deref() {
            let start = local_offset as usize;
            dst[..n].copy_from_slice(&saved[start..start + n]);
            return Ok(n);
        }

        self.window.read(self.offset + local_offset, dst, n)
    }

    /// Captures this frame's raw bytes into `save_buffer` immediately,
    /// before the window can evict them. Returns the number of bytes
    /// captured (the frame's resolved length).
    pub(crate) fn capture(&self) -> Result<usize> {
        let len = self.frame_length() as usize;
        let mut bytes = vec![0u8; len];
        let n = self.window.read(self.offset, &mut bytes, len)?;
        bytes.truncate(n);
        *self.save_buffer.lock().unwrap() = Some(bytes.into_boxed_slice());
        Ok(n)
    }

    pub(crate) fn is_captured(&self) -> bool {
        self.save_buffer.lock().unwrap().is_some()
    }
}

impl std::fmt::Debug for MpegFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpegFrame")
            .field("number", &self.number)
            .field("offset", &self.offset)
            .field("frame_length", &self.frame_length())
            .field("version", &self.version)
            .field("layer", &self.layer)
            .field("channel_mode", &self.channel_mode)
            .field("sample_rate", &self.sample_rate)
            .field("bit_rate", &self.bit_rate)
            .field("sample_offset", &self.sample_offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_frame_header;
    use crate::options::ReaderOptions;
    use std::io::Cursor;

    fn header() -> FrameHeader {
        parse_frame_header(0xFFFB_9064).unwrap()
    }

    fn test_window(data: Vec<u8>) -> Arc<WindowBuffer> {
        Arc::new(WindowBuffer::new(Box::new(Cursor::new(data)), &ReaderOptions::default()))
    }

    #[test]
    fn non_free_format_length_is_resolved_immediately() {
        let w = test_window(vec![0u8; 512]);
        let f = MpegFrame::new(0, 0, &header(), 0, w);
        assert!(f.is_length_resolved());
        assert_eq!(f.frame_length(), 417);
    }

    #[test]
    fn free_format_starts_unresolved() {
        let mut h = header();
        h.bit_rate_index = 0;
        h.frame_length = None;
        let w = test_window(vec![0u8; 512]);
        let f = MpegFrame::new(0, 0, &h, 0, w);
        assert!(!f.is_length_resolved());
        f.resolve_free_format_length(500);
        assert!(f.is_length_resolved());
        assert_eq!(f.frame_length(), 500);
    }

    #[test]
    fn linked_list_append_is_observable() {
        let w = test_window(vec![0u8; 1024]);
        let a = Arc::new(MpegFrame::new(0, 0, &header(), 0, w.clone()));
        let b = Arc::new(MpegFrame::new(1, 417, &header(), 1152, w));
        a.set_next(b.clone());
        assert_eq!(a.next().unwrap().offset, b.offset);
    }

    #[test]
    fn read_serves_bytes_from_window() {
        let mut data = vec![0u8; 512];
        data[10] = 0xAB;
        let w = test_window(data);
        let f = MpegFrame::new(0, 0, &header(), 0, w);
        let mut out = [0u8; 1];
        let n = f.read(10, &mut out).unwrap();
        assert_eq!(n, 1);
        assert_eq!(out[0], 0xAB);
    }

    #[test]
    fn capture_then_read_serves_from_save_buffer() {
        let mut data = vec![0u8; 512];
        data[5] = 0x7E;
        let w = test_window(data);
        let f = MpegFrame::new(0, 0, &header(), 0, w);
        f.capture().unwrap();
        assert!(f.is_captured());
        let mut out = [0u8; 1];
        f.read(5, &mut out).unwrap();
        assert_eq!(out[0], 0x7E);
    }
}
