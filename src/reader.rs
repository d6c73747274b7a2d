// SPDX-License-Identifier: MPL-2.0

//! `MpegReader`: the crate's public entry point, tying the window buffer,
//! scanner, and frame catalog together behind two independent locks.
//!
//! Grounded on `symphonia_bundle_mp3::demuxer::Mp3Reader` for the
//! construction contract (probe forward until enough frames are found to
//! trust the stream, fail otherwise) and on
//! `symphonia_core::formats::FormatReader::seek`'s estimate-then-walk shape
//! for `seek_to`.

use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, warn};

use crate::error::{ReaderError, Result};
use crate::frame::MpegFrame;
use crate::io::{Source, WindowBuffer};
use crate::options::ReaderOptions;
use crate::scanner::ScannerState;

struct Inner {
    window: Arc<WindowBuffer>,
    /// `frame_lock`: guards the scanner/catalog. Never held while the
    /// window's own internal `source_lock` is held (the window always
    /// acquires `source_lock` internally, on its own, for the duration of a
    /// single buffer fetch only).
    state: Mutex<ScannerState>,
    options: ReaderOptions,
}

/// A bitstream-level reader over an MPEG audio source: framing, resync, VBR
/// side-info, and ID3/RIFF container skipping. Does not decode audio.
pub struct MpegReader {
    inner: Arc<Inner>,
}

impl MpegReader {
    /// Constructs a reader with default options. Eagerly probes for the
    /// first two frames; fails with [`ReaderError::NotAValidMpegStream`] if
    /// fewer than two can be found.
    pub fn new(source: Box<dyn Source>) -> Result<Self> {
        Self::with_options(source, ReaderOptions::default())
    }

    pub fn with_options(source: Box<dyn Source>, options: ReaderOptions) -> Result<Self> {
        let can_seek = source.is_seekable();
        let window = Arc::new(WindowBuffer::new(source, &options));
        let mut state = ScannerState::new();

        if !state.find_next_frame(&window, can_seek)? {
            return Err(ReaderError::NotAValidMpegStream);
        }
        if !state.find_next_frame(&window, can_seek)? {
            return Err(ReaderError::NotAValidMpegStream);
        }
        state.current = state.first.clone();

        debug!(
            "constructed reader: sample_rate={} channels={}",
            state.first.as_ref().unwrap().sample_rate,
            state.first.as_ref().unwrap().channel_mode.channel_count()
        );

        Ok(MpegReader { inner: Arc::new(Inner { window, state: Mutex::new(state), options }) })
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.state.lock().unwrap().first.as_ref().map(|f| f.sample_rate).unwrap_or(0)
    }

    pub fn channels(&self) -> u32 {
        self.inner
            .state
            .lock()
            .unwrap()
            .first
            .as_ref()
            .map(|f| f.channel_mode.channel_count())
            .unwrap_or(0)
    }

    pub fn first_frame_sample_count(&self) -> u32 {
        self.inner.state.lock().unwrap().first.as_ref().map(|f| f.sample_count).unwrap_or(0)
    }

    pub fn can_seek(&self) -> bool {
        self.inner.window.can_seek()
    }

    /// Total PCM sample count for the stream, if known: from a VBR side-info
    /// frame count when present, or from the fully-walked catalog once
    /// `read_to_end` (or enough `next_frame` calls) has reached the end.
    /// Returns `-1` when neither is available yet.
    pub fn sample_count(&self) -> i64 {
        let state = self.inner.state.lock().unwrap();

        if let (Some(vbr), Some(first)) = (state.vbr_info, &state.first) {
            if let Some(sc) = vbr.sample_count(first.sample_count) {
                return sc as i64;
            }
        }

        if state.end_found {
            if let Some(last) = &state.last {
                return (last.sample_offset + last.sample_count as u64) as i64;
            }
        }

        -1
    }

    /// Advances the read cursor to the frame covering `sample`, extending
    /// the catalog by scanning forward as needed. Returns the actual sample
    /// offset of the frame landed on.
    ///
    /// The starting point is purely a shortcut to shorten the walk; the walk
    /// itself is the same linear catalog traversal regardless of how good
    /// that estimate turns out to be, including when it overshoots past the
    /// last known frame. While every catalogued frame so far covers the same
    /// sample count (`!mixed_frame_size`), the starting frame is estimated by
    /// dividing `sample` by that common size instead of by distance from the
    /// current cursor; once any two frames have differed in size, that
    /// division no longer points anywhere near the right frame, so the
    /// estimate falls back to the current-cursor-vs-first comparison.
    pub fn seek_to(&self, sample: u64) -> Result<i64> {
        if !self.can_seek() {
            return Err(ReaderError::CannotSeek);
        }

        let mut state = self.inner.state.lock().unwrap();
        let first = match state.first.clone() {
            Some(f) => f,
            None => return Err(ReaderError::NotAValidMpegStream),
        };

        let mut node = if !state.mixed_frame_size && first.sample_count > 0 {
            let target_index = sample / first.sample_count as u64;
            match &state.current {
                Some(cur) if cur.number <= target_index => cur.clone(),
                _ => first.clone(),
            }
        } else {
            match &state.current {
                Some(cur) if cur.sample_offset <= sample => cur.clone(),
                _ => first.clone(),
            }
        };

        loop {
            let node_end = node.sample_offset + node.sample_count as u64;
            if sample < node_end {
                break;
            }

            if let Some(next) = node.next() {
                node = next;
                continue;
            }

            if state.end_found {
                break; // overshoot past the last frame: land on it regardless
            }

            if !state.find_next_frame(&self.inner.window, true)? {
                break; // hit end-of-stream while walking
            }
            node = state.last.clone().unwrap();
        }

        state.current = Some(node.clone());
        Ok(node.sample_offset as i64)
    }

    /// Returns the frame at the current cursor and advances it, extending
    /// the catalog by one frame if the cursor was already at its tail.
    /// Returns `Ok(None)` at clean end-of-stream.
    ///
    /// On a seekable source, the outgoing frame is handed off by capturing
    /// its bytes and raising the window's discard watermark past its end,
    /// instead of leaving it to the window's implicit rewind-and-refill.
    pub fn next_frame(&self) -> Result<Option<Arc<MpegFrame>>> {
        let mut state = self.inner.state.lock().unwrap();

        let node = match state.current.clone().or_else(|| state.first.clone()) {
            Some(n) => n,
            None => return Ok(None),
        };

        if !self.can_seek() && node.is_captured() {
            state.outstanding_save_bytes = state.outstanding_save_bytes.saturating_sub(node.frame_length());
        }

        let advance_target = match node.next() {
            Some(next) => Some(next),
            None => {
                if state.end_found {
                    None
                } else if state.find_next_frame(&self.inner.window, self.can_seek())? {
                    state.last.clone()
                } else {
                    None
                }
            }
        };

        if self.can_seek() {
            let _ = node.capture();
            self.inner.window.discard_through(node.end_offset());
        }

        state.current = advance_target;
        Ok(Some(node))
    }

    /// Scans the remainder of the stream, populating the full catalog and
    /// resolving `sample_count()`. On a forward-only source, proactively
    /// captures each frame's bytes (so they survive the window's eviction
    /// before a caller reaches them via `next_frame`), pausing when
    /// outstanding captured bytes exceed
    /// [`ReaderOptions::read_to_end_backpressure_bytes`] until `next_frame`
    /// has drained some of them.
    ///
    /// A disposed source ([`ReaderError::ObjectDisposed`]) ends the scan
    /// quietly instead of propagating; every other error (and every other
    /// caller of the scanner) propagates unchanged.
    pub fn read_to_end(&self) -> Result<()> {
        let can_seek = self.can_seek();

        loop {
            let mut state = self.inner.state.lock().unwrap();
            if state.end_found {
                return Ok(());
            }

            if !can_seek
                && state.outstanding_save_bytes >= self.inner.options.read_to_end_backpressure_bytes
            {
                drop(state);
                thread::sleep(self.inner.options.read_to_end_poll_interval);
                continue;
            }

            match state.find_next_frame(&self.inner.window, can_seek) {
                Ok(true) => {
                    if !can_seek {
                        if let Some(last) = state.last.clone() {
                            let _ = last.capture().map(|n| {
                                state.outstanding_save_bytes += n as u64;
                            });
                        }
                    }
                }
                Ok(false) => return Ok(()),
                Err(ReaderError::ObjectDisposed) => {
                    warn!("source disposed during read_to_end; stopping quietly");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}
