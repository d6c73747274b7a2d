// SPDX-License-Identifier: MPL-2.0

//! The resync state machine: walks a source byte by byte, recognizing
//! leading/trailing tags and MPEG frame syncs, and appends each recognized
//! frame to the catalog.
//!
//! Grounded on `symphonia_bundle_mp3::demuxer::Mp3Reader::next_packet`'s
//! read-candidate-verify-next-candidate loop for the overall shape, with tag
//! recognition folded in ahead of (`crate::tag`) and behind
//! (`crate::tag::id3v1`) the MPEG search, matching how
//! `symphonia_core::probe` orders format probes by priority.

use std::sync::Arc;

use log::{debug, trace};

use crate::error::{ReaderError, Result};
use crate::frame::MpegFrame;
use crate::header::{self, ChannelMode, FrameHeader};
use crate::io::WindowBuffer;
use crate::tag::{detect_id3v1, detect_id3v2, detect_riff, TagSpan};
use crate::vbr::{detect_vbr_info, VbrInfo};

/// Catalog and scanner cursor state, held behind the reader's single
/// `frame_lock`.
pub struct ScannerState {
    pub first: Option<Arc<MpegFrame>>,
    pub last: Option<Arc<MpegFrame>>,
    /// Cursor used by `MpegReader::next_frame`/`seek_to`. Distinct from
    /// `last`: `last` is the catalog's append point, `current` is the
    /// consumer's read position.
    pub current: Option<Arc<MpegFrame>>,
    pub count: u64,
    /// The most recently appended free-format frame whose length is still
    /// unresolved, if any. While this is `Some`, the format-mismatch guard
    /// is active: a sync candidate is only accepted if its header matches
    /// this frame's version/layer/sample-rate/channel-mode.
    last_free: Option<Arc<MpegFrame>>,
    /// Next absolute offset the scanner will examine.
    pub read_offset: u64,
    pub end_found: bool,
    pub id3v2: Option<TagSpan>,
    pub id3v1: Option<TagSpan>,
    pub riff: Option<TagSpan>,
    riff_checked: bool,
    pub vbr_info: Option<VbrInfo>,
    /// Set once a catalogued frame's sample count differs from the one
    /// before it, and never cleared. While `false`, every frame in the
    /// catalog covers the same number of samples, which `seek_to` uses to
    /// estimate a target frame directly instead of walking from `first` or
    /// `current`.
    pub mixed_frame_size: bool,
    /// Total bytes held in frames' `save_buffer`s that `next_frame` has not
    /// yet handed to a caller. Used by `read_to_end`'s backpressure pause.
    pub outstanding_save_bytes: u64,
}

impl ScannerState {
    pub fn new() -> Self {
        ScannerState {
            first: None,
            last: None,
            current: None,
            count: 0,
            last_free: None,
            read_offset: 0,
            end_found: false,
            id3v2: None,
            id3v1: None,
            riff: None,
            riff_checked: false,
            vbr_info: None,
            mixed_frame_size: false,
            outstanding_save_bytes: 0,
        }
    }

    pub fn has_unresolved_free_frame(&self) -> bool {
        self.last_free.is_some()
    }

    /// Extends the catalog by exactly one frame, skipping over any
    /// recognized tag spans first. Returns `Ok(true)` if a frame was
    /// appended, `Ok(false)` at clean end-of-stream.
    pub fn find_next_frame(&mut self, wb: &Arc<WindowBuffer>, can_seek: bool) -> Result<bool> {
        loop {
            if self.end_found {
                return Ok(false);
            }

            if let Some(span) = detect_id3v2(wb, self.read_offset)? {
                debug!("id3v2 tag at {}: {} bytes", span.offset, span.length);
                self.id3v2.get_or_insert(span);
                self.read_offset = span.offset + span.length;
                wb.discard_through(self.read_offset);
                continue;
            }

            if !self.riff_checked {
                self.riff_checked = true;
                if let Some(span) = detect_riff(wb, self.read_offset)? {
                    debug!("riff header at {}: {} bytes", span.offset, span.length);
                    self.riff = Some(span);
                    self.read_offset = span.offset + span.length;
                    wb.discard_through(self.read_offset);
                    continue;
                }
            }

            match self.try_sync(wb, can_seek)? {
                SyncOutcome::Frame(frame) => {
                    self.append_frame(wb, frame);
                    return Ok(true);
                }
                SyncOutcome::Eof => {
                    self.end_found = true;
                    return Ok(false);
                }
                SyncOutcome::Resync => continue,
            }
        }
    }

    fn append_frame(&mut self, wb: &Arc<WindowBuffer>, frame: MpegFrame) {
        let frame = Arc::new(frame);

        if let Some(last) = &self.last {
            last.set_next(frame.clone());
            if frame.sample_count != last.sample_count {
                self.mixed_frame_size = true;
            }
        } else {
            self.first = Some(frame.clone());
        }

        if frame.is_free_format() {
            self.last_free = Some(frame.clone());
        } else {
            // Previous frames' bytes were already surfaced via the catalog;
            // anything before this frame's start can be reclaimed, unless a
            // free-format frame earlier in the stream is still unresolved
            // and needs its own bytes to stay resident.
            let floor = self.last_free.as_ref().map(|f| f.offset).unwrap_or(frame.offset);
            wb.discard_through(floor);
        }

        self.last = Some(frame);
        self.count += 1;
    }

    /// Reads one candidate header at `read_offset` and classifies it.
    fn try_sync(&mut self, wb: &Arc<WindowBuffer>, can_seek: bool) -> Result<SyncOutcome> {
        let mut word_bytes = [0u8; 4];
        let n = wb.read(self.read_offset, &mut word_bytes, 4)?;
        if n < 4 {
            if let Some(outcome) = self.try_mid_stream_tag(wb)? {
                return Ok(outcome);
            }
            return self.classify_short_read(wb, can_seek);
        }

        let word = u32::from_be_bytes(word_bytes);
        if !header::is_sync_word(word) {
            if let Some(outcome) = self.try_mid_stream_tag(wb)? {
                return Ok(outcome);
            }
            self.reject_candidate(wb);
            return Ok(SyncOutcome::Resync);
        }

        let parsed = match header::parse_frame_header(word) {
            Some(h) => h,
            None => {
                if let Some(outcome) = self.try_mid_stream_tag(wb)? {
                    return Ok(outcome);
                }
                self.reject_candidate(wb);
                return Ok(SyncOutcome::Resync);
            }
        };

        if let Some(pending) = self.last_free.clone() {
            if !headers_compatible(&pending, &parsed) {
                trace!(
                    "rejecting candidate at {}: format mismatch with pending free-format frame",
                    self.read_offset
                );
                self.reject_candidate(wb);
                return Ok(SyncOutcome::Resync);
            }

            let length = self.read_offset - pending.offset;
            pending.resolve_free_format_length(length);
            self.last_free = None;
            debug!("resolved free-format frame at {} to {} bytes", pending.offset, length);
        }

        let offset = self.read_offset;

        // If the catalog is still empty, this candidate might be a Xing/Info/
        // VBRI side-info header rather than an audio frame: some VBR encoders
        // write one silent frame up front carrying the stream's total frame
        // and byte counts. Such a frame is never catalogued — its samples
        // are not audio — so the first frame handed out to a caller is
        // always the first real audio frame, numbered zero.
        if self.first.is_none() {
            if let Some(info) = self.sniff_vbr_info(wb, offset, &parsed)? {
                debug!("vbr side-info header at {}: silent frame, not catalogued", offset);
                self.vbr_info.get_or_insert(info);
                self.read_offset = match parsed.frame_length {
                    Some(len) => offset + len as u64,
                    None => offset + 4,
                };
                return Ok(SyncOutcome::Resync);
            }
        }

        let number = self.count;
        let sample_offset =
            self.last.as_ref().map(|f| f.sample_offset + f.sample_count as u64).unwrap_or(0);

        let frame = MpegFrame::new(number, offset, &parsed, sample_offset, wb.clone());

        self.read_offset = match parsed.frame_length {
            Some(len) => offset + len as u64,
            None => offset + 4, // free-format: keep scanning byte by byte for the resolving sync
        };

        Ok(SyncOutcome::Frame(frame))
    }

    /// A candidate at `read_offset` failed; advance past it by one byte and
    /// release anything the window no longer needs to keep resident.
    fn reject_candidate(&mut self, wb: &Arc<WindowBuffer>) {
        self.read_offset += 1;
        let floor = self.last_free.as_ref().map(|f| f.offset).unwrap_or(self.read_offset);
        wb.discard_through(floor);
    }

    /// Lowest-priority check, tried only once a sync candidate at
    /// `read_offset` has failed: an ID3v1 trailer or a mid-stream ID3v2 tag.
    /// Real audio data essentially never spells out `"TAG"` or `"ID3"`, so
    /// this is cheap enough to try on every failed candidate rather than
    /// only at end-of-stream.
    fn try_mid_stream_tag(&mut self, wb: &Arc<WindowBuffer>) -> Result<Option<SyncOutcome>> {
        if let Some(span) = detect_id3v1(wb, self.read_offset)? {
            debug!("id3v1 tag at {}", span.offset);
            self.id3v1 = Some(span);
            self.read_offset = span.offset + span.length;
            wb.discard_through(self.read_offset);
            return Ok(Some(SyncOutcome::Resync));
        }

        if let Some(span) = detect_id3v2(wb, self.read_offset)? {
            debug!("mid-stream id3v2 tag at {}: {} bytes", span.offset, span.length);
            self.id3v2.get_or_insert(span);
            self.read_offset = span.offset + span.length;
            wb.discard_through(self.read_offset);
            return Ok(Some(SyncOutcome::Resync));
        }

        Ok(None)
    }

    /// A 4-byte read at `read_offset` came back short. Distinguishes true
    /// end-of-stream from a forward-only window that has run out of room to
    /// hold a pending free-format frame's bytes: the latter can only be
    /// recovered by seeking back, which a forward-only source cannot do.
    ///
    /// At true end-of-stream, a still-unresolved free-format frame is
    /// resolved to run right up to the end of the source — every
    /// free-format stream's last frame ends exactly there, seekable or not,
    /// since there is no further data to search regardless.
    fn classify_short_read(&mut self, wb: &WindowBuffer, can_seek: bool) -> Result<SyncOutcome> {
        if let Some(eof) = wb.eof_offset() {
            if self.read_offset >= eof {
                if let Some(pending) = self.last_free.take() {
                    let length = eof - pending.offset;
                    pending.resolve_free_format_length(length);
                    debug!(
                        "resolved free-format frame at {} to {} bytes at end-of-stream",
                        pending.offset, length
                    );
                }
                return Ok(SyncOutcome::Eof);
            }
        }

        if !can_seek && self.last_free.is_some() {
            return Err(ReaderError::FreeFormatRequiresSeek);
        }

        Ok(SyncOutcome::Eof)
    }

    fn sniff_vbr_info(
        &self,
        wb: &WindowBuffer,
        offset: u64,
        header: &FrameHeader,
    ) -> Result<Option<VbrInfo>> {
        // Generous bound: side info, an 8-byte Xing/Info tag + flags, up to a
        // 100-byte TOC and a 4-byte quality indicator, or a VBRI block that
        // starts at a fixed 36-byte offset.
        let want = (header.side_info_len() + 4 + 8 + 100 + 4).max(36 + 18);
        let mut payload = vec![0u8; want];
        let got = wb.read(offset, &mut payload, want)?;
        payload.truncate(got);
        Ok(detect_vbr_info(header, &payload))
    }
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::new()
    }
}

enum SyncOutcome {
    Frame(MpegFrame),
    Eof,
    Resync,
}

/// Whether `candidate` may be accepted as the frame that resolves `pending`
/// (a free-format frame awaiting its length). Guards against byte noise
/// that happens to look like a sync word but belongs to a different stream
/// format.
fn headers_compatible(pending: &MpegFrame, candidate: &FrameHeader) -> bool {
    pending.version == candidate.version
        && pending.layer == candidate.layer
        && pending.sample_rate == candidate.sample_rate
        && channel_count(pending.channel_mode) == candidate.channel_mode.channel_count()
}

fn channel_count(mode: ChannelMode) -> u32 {
    mode.channel_count()
}
