// SPDX-License-Identifier: MPL-2.0

//! `WindowBuffer` — a random-access byte window over a possibly forward-only
//! source, with a discardable prefix and on-demand growth.
//!
//! Grounded on `symphonia_core::io::media_source_stream::MediaSourceStream`
//! for the split of "buffered state" vs. "underlying source" into two
//! independently lockable pieces, adapted from that type's ring buffer into
//! a flat, offset-addressed buffer since random-access-by-absolute-offset
//! (not sequential `Read`) is this type's primary contract.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Mutex;

use log::trace;

use crate::error::{ReaderError, Result};
use crate::options::ReaderOptions;

use super::source::Source;

struct BufState {
    /// Resident bytes, `data[i]` is absolute offset `base_offset + i`.
    data: Vec<u8>,
    base_offset: u64,
    /// Prefix length the owner has released for eviction.
    discard_count: usize,
    /// Current soft capacity (power of two).
    window_cap: usize,
}

struct SourceState {
    source: Box<dyn Source>,
    /// Absolute position the underlying source is positioned at.
    pos: u64,
    eof_offset: Option<u64>,
}

/// Random-access byte window over a [`Source`]. See module docs.
pub struct WindowBuffer {
    buf: Mutex<BufState>,
    source: Mutex<SourceState>,
    source_can_seek: bool,
    forward_only_cap: usize,
}

impl WindowBuffer {
    pub fn new(source: Box<dyn Source>, options: &ReaderOptions) -> Self {
        assert!(options.initial_window_capacity.is_power_of_two());
        assert!(options.forward_only_capacity.is_power_of_two());

        let source_can_seek = source.is_seekable();

        WindowBuffer {
            buf: Mutex::new(BufState {
                data: Vec::with_capacity(options.initial_window_capacity),
                base_offset: 0,
                discard_count: 0,
                window_cap: options.initial_window_capacity,
            }),
            source: Mutex::new(SourceState { source, pos: 0, eof_offset: None }),
            source_can_seek,
            forward_only_cap: options.forward_only_capacity,
        }
    }

    pub fn can_seek(&self) -> bool {
        self.source_can_seek
    }

    pub fn eof_offset(&self) -> Option<u64> {
        self.source.lock().unwrap().eof_offset
    }

    /// Reads up to `count` bytes starting at absolute offset `off` into
    /// `dst`. Returns the number of bytes copied; fewer than requested only
    /// at end-of-stream (or, for a forward-only source pinned at its
    /// capacity ceiling, when no further bytes can be buffered).
    pub fn read(&self, off: u64, dst: &mut [u8], count: usize) -> Result<usize> {
        assert!(dst.len() >= count);
        if count == 0 {
            return Ok(0);
        }

        if let Some(eof) = self.eof_offset() {
            if off >= eof {
                return Ok(0);
            }
        }

        let mut buf = self.buf.lock().unwrap();

        if off < buf.base_offset {
            if !self.source_can_seek {
                return Err(ReaderError::BackwardSeekOnForwardStream);
            }
            self.rewind_and_refill(&mut buf, off)?;
        }
        else if off > buf.base_offset + buf.data.len() as u64 && self.source_can_seek {
            // A forward gap beyond the buffered tail: jump directly rather than
            // sequentially filling (and possibly truncating) through it.
            self.rewind_and_refill(&mut buf, off)?;
        }

        let mut copied = 0usize;
        while copied < count {
            let want = off + copied as u64;
            let local = (want - buf.base_offset) as usize;

            if local < buf.data.len() {
                let avail = buf.data.len() - local;
                let n = avail.min(count - copied);
                dst[copied..copied + n].copy_from_slice(&buf.data[local..local + n]);
                copied += n;
                continue;
            }

            debug_assert_eq!(local, buf.data.len());
            let filled = self.fetch_tail(&mut buf, count - copied)?;
            if filled == 0 {
                break;
            }
        }

        Ok(copied)
    }

    pub fn read_byte(&self, off: u64) -> Result<Option<u8>> {
        let mut b = [0u8; 1];
        let n = self.read(off, &mut b, 1)?;
        Ok(if n == 1 { Some(b[0]) } else { None })
    }

    /// Raises the discard watermark to `max(current, off - base_offset)`.
    pub fn discard_through(&self, off: u64) {
        let mut buf = self.buf.lock().unwrap();
        if off <= buf.base_offset {
            return;
        }
        let rel = ((off - buf.base_offset) as usize).min(buf.data.len());
        if rel > buf.discard_count {
            buf.discard_count = rel;
        }
        if buf.discard_count == buf.data.len() {
            self.compact(&mut buf);
        }
    }

    fn compact(&self, buf: &mut BufState) {
        let d = buf.discard_count;
        if d == 0 {
            return;
        }
        buf.data.drain(0..d);
        buf.base_offset += d as u64;
        buf.discard_count = 0;
    }

    /// Implements the growth/compaction policy of WindowBuffer's contract:
    /// compact the discarded prefix, grow geometrically up to the capacity
    /// ceiling, then (seekable sources only) either grow once more for an
    /// oversized single read or truncate the resident buffer entirely to
    /// make room for forward progress.
    fn ensure_room(&self, buf: &mut BufState, needed: usize) {
        if buf.discard_count > 0 && buf.data.len() + needed > buf.window_cap {
            self.compact(buf);
        }

        if buf.data.len() + needed <= buf.window_cap {
            return;
        }

        while buf.window_cap < self.forward_only_cap && buf.data.len() + needed > buf.window_cap {
            buf.window_cap = (buf.window_cap * 2).min(self.forward_only_cap);
        }

        if buf.data.len() + needed <= buf.window_cap {
            return;
        }

        if self.source_can_seek {
            if needed > self.forward_only_cap {
                // One-shot grow to service an oversized single read.
                buf.window_cap = (buf.data.len() + needed).next_power_of_two();
                return;
            }

            // Truncate: abandon resident contents (including any
            // undiscarded prefix) to make room. The underlying source's
            // position already sits at the tail, so no reseek is needed.
            trace!("window buffer truncated at capacity ceiling");
            let tail_pos = buf.base_offset + buf.data.len() as u64;
            buf.data.clear();
            buf.base_offset = tail_pos;
            buf.discard_count = 0;
            return;
        }

        // Forward-only source pinned at its capacity ceiling: no more room
        // can be made. The caller will observe a short read.
    }

    fn fetch_tail(&self, buf: &mut BufState, needed: usize) -> Result<usize> {
        self.ensure_room(buf, needed.max(1));

        let room = buf.window_cap.saturating_sub(buf.data.len());
        if room == 0 {
            return Ok(0);
        }

        self.fetch_from_source(buf, needed.min(room))
    }

    fn fetch_from_source(&self, buf: &mut BufState, want: usize) -> Result<usize> {
        let mut src = self.source.lock().unwrap();

        let old_len = buf.data.len();
        buf.data.resize(old_len + want, 0);

        let mut filled = 0usize;
        while filled < want {
            match src.source.read(&mut buf.data[old_len + filled..old_len + want]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    buf.data.truncate(old_len);
                    return Err(e.into());
                }
            }
        }

        buf.data.truncate(old_len + filled);
        src.pos += filled as u64;

        if filled < want {
            src.eof_offset = Some(src.pos);
        }

        Ok(filled)
    }

    fn rewind_and_refill(&self, buf: &mut BufState, off: u64) -> Result<()> {
        let mut src = self.source.lock().unwrap();
        src.source.seek(SeekFrom::Start(off))?;
        src.pos = off;
        drop(src);

        buf.data.clear();
        buf.base_offset = off;
        buf.discard_count = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::ForwardOnly;
    use std::io::Cursor;

    fn random_bytes(len: usize) -> Vec<u8> {
        let mut lcg: u32 = 0xec57_c4bf;
        let mut bytes = vec![0u8; len];
        for b in bytes.iter_mut() {
            lcg = lcg.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *b = (lcg >> 24) as u8;
        }
        bytes
    }

    #[test]
    fn reads_match_source_on_seekable() {
        let data = random_bytes(5 * 9000);
        let wb = WindowBuffer::new(Box::new(Cursor::new(data.clone())), &ReaderOptions::default());

        let mut out = vec![0u8; 777];
        let n = wb.read(12345, &mut out, 777).unwrap();
        assert_eq!(n, 777);
        assert_eq!(&out[..], &data[12345..12345 + 777]);
    }

    #[test]
    fn backward_seek_within_buffer_on_seekable() {
        let data = random_bytes(4096);
        let wb = WindowBuffer::new(Box::new(Cursor::new(data.clone())), &ReaderOptions::default());

        let mut out = vec![0u8; 10];
        wb.read(2000, &mut out, 10).unwrap();
        let n = wb.read(10, &mut out, 10).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&out[..], &data[10..20]);
    }

    #[test]
    fn forward_only_rejects_backward_read_past_discard() {
        let data = random_bytes(4096);
        let wb = WindowBuffer::new(
            Box::new(ForwardOnly::new(Cursor::new(data))),
            &ReaderOptions::default(),
        );

        let mut out = vec![0u8; 10];
        wb.read(2000, &mut out, 10).unwrap();
        wb.discard_through(2010);

        let err = wb.read(5, &mut out, 10).unwrap_err();
        assert!(matches!(err, ReaderError::BackwardSeekOnForwardStream));
    }

    #[test]
    fn short_read_at_eof_is_not_an_error() {
        let data = random_bytes(100);
        let wb = WindowBuffer::new(Box::new(Cursor::new(data)), &ReaderOptions::default());

        let mut out = vec![0u8; 50];
        let n = wb.read(80, &mut out, 50).unwrap();
        assert_eq!(n, 20);

        let n = wb.read(200, &mut out, 50).unwrap();
        assert_eq!(n, 0);
    }
}
