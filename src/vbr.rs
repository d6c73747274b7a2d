// SPDX-License-Identifier: MPL-2.0

//! Xing / Info / VBRI / LAME VBR side-info recognition.
//!
//! Grounded on `adierking_unplug`'s `audio::transport::mp3::analyze_mp3`:
//! the `Xing`/`Info` token sits immediately after the side-info block, and
//! its flags word selects which optional fields follow. `VBRI` instead sits
//! at a fixed byte offset from the frame header, independent of side-info
//! length.

use crate::header::FrameHeader;

const XING_FLAG_FRAMES: u32 = 0x1;
const XING_FLAG_BYTES: u32 = 0x2;
const XING_FLAG_TOC: u32 = 0x4;
const XING_FLAG_QUALITY: u32 = 0x8;

const VBRI_OFFSET: usize = 36;

/// Recognized VBR side-info, carrying whatever the encoder chose to publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VbrInfo {
    /// Total number of frames in the stream, when published.
    pub frame_count: Option<u32>,
    /// Total number of audio bytes in the stream, when published.
    pub byte_count: Option<u32>,
}

/// Attempts to recognize a Xing/Info, VBRI, or bare LAME side-info block
/// immediately following an MPEG frame header at `frame`, within `payload`
/// (the frame's bytes starting at the header, length at least
/// `header.frame_length` for a CBR-sized frame — callers pass the bytes they
/// have available, which may be shorter).
///
/// Returns `None` if no recognized tag is present; the frame is then a
/// plain audio frame.
pub fn detect_vbr_info(header: &FrameHeader, payload: &[u8]) -> Option<VbrInfo> {
    detect_xing(header, payload).or_else(|| detect_vbri(payload))
}

fn detect_xing(header: &FrameHeader, payload: &[u8]) -> Option<VbrInfo> {
    let tag_offset = 4 + header.side_info_len();
    let tag = payload.get(tag_offset..tag_offset + 4)?;
    if tag != b"Xing" && tag != b"Info" {
        return None;
    }

    let flags = u32::from_be_bytes(payload.get(tag_offset + 4..tag_offset + 8)?.try_into().ok()?);

    let mut cursor = tag_offset + 8;
    let frame_count = if flags & XING_FLAG_FRAMES != 0 {
        let v = u32::from_be_bytes(payload.get(cursor..cursor + 4)?.try_into().ok()?);
        cursor += 4;
        Some(v)
    } else {
        None
    };

    let byte_count = if flags & XING_FLAG_BYTES != 0 {
        let v = u32::from_be_bytes(payload.get(cursor..cursor + 4)?.try_into().ok()?);
        cursor += 4;
        Some(v)
    } else {
        None
    };

    if flags & XING_FLAG_TOC != 0 {
        cursor += 100;
    }
    if flags & XING_FLAG_QUALITY != 0 {
        let _ = payload.get(cursor..cursor + 4)?;
    }

    Some(VbrInfo { frame_count, byte_count })
}

fn detect_vbri(payload: &[u8]) -> Option<VbrInfo> {
    let tag = payload.get(VBRI_OFFSET..VBRI_OFFSET + 4)?;
    if tag != b"VBRI" {
        return None;
    }

    // version(2) delay(2) quality(2) byte_count(4) frame_count(4); TOC fields
    // beyond this are decoder/seek-table territory and are ignored.
    let byte_count = u32::from_be_bytes(
        payload.get(VBRI_OFFSET + 10..VBRI_OFFSET + 14)?.try_into().ok()?,
    );
    let frame_count = u32::from_be_bytes(
        payload.get(VBRI_OFFSET + 14..VBRI_OFFSET + 18)?.try_into().ok()?,
    );

    Some(VbrInfo { frame_count: Some(frame_count), byte_count: Some(byte_count) })
}

impl VbrInfo {
    /// Total PCM sample count for the stream, when a frame count was published.
    pub fn sample_count(&self, samples_per_frame: u32) -> Option<u64> {
        self.frame_count.map(|f| f as u64 * samples_per_frame as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{ChannelMode, MpegLayer, MpegVersion};

    fn stereo_l3_header() -> FrameHeader {
        FrameHeader {
            version: MpegVersion::Mpeg1,
            layer: MpegLayer::Layer3,
            channel_mode: ChannelMode::Stereo,
            sample_rate: 44_100,
            bit_rate_index: 9,
            bit_rate: 128_000,
            has_padding: false,
            frame_length: Some(417),
        }
    }

    fn xing_payload(flags: u32, frames: Option<u32>, bytes: Option<u32>) -> Vec<u8> {
        let mut p = vec![0u8; 4 + 32]; // header + side info (stereo MPEG1)
        p.extend_from_slice(b"Xing");
        p.extend_from_slice(&flags.to_be_bytes());
        if let Some(f) = frames {
            p.extend_from_slice(&f.to_be_bytes());
        }
        if let Some(b) = bytes {
            p.extend_from_slice(&b.to_be_bytes());
        }
        p
    }

    #[test]
    fn recognizes_xing_with_frame_and_byte_counts() {
        let header = stereo_l3_header();
        let payload = xing_payload(XING_FLAG_FRAMES | XING_FLAG_BYTES, Some(1234), Some(99999));
        let info = detect_vbr_info(&header, &payload).unwrap();
        assert_eq!(info.frame_count, Some(1234));
        assert_eq!(info.byte_count, Some(99999));
        assert_eq!(info.sample_count(1152), Some(1234 * 1152));
    }

    #[test]
    fn recognizes_info_tag_as_xing_variant() {
        let header = stereo_l3_header();
        let mut payload = xing_payload(0, None, None);
        payload[36..40].copy_from_slice(b"Info");
        let info = detect_vbr_info(&header, &payload).unwrap();
        assert_eq!(info.frame_count, None);
    }

    #[test]
    fn recognizes_vbri_at_fixed_offset() {
        let header = stereo_l3_header();
        let mut payload = vec![0u8; VBRI_OFFSET];
        payload.extend_from_slice(b"VBRI");
        payload.extend_from_slice(&0u16.to_be_bytes()); // version
        payload.extend_from_slice(&0u16.to_be_bytes()); // delay
        payload.extend_from_slice(&0u16.to_be_bytes()); // quality
        payload.extend_from_slice(&55555u32.to_be_bytes()); // byte count
        payload.extend_from_slice(&4321u32.to_be_bytes()); // frame count
        let info = detect_vbr_info(&header, &payload).unwrap();
        assert_eq!(info.frame_count, Some(4321));
        assert_eq!(info.byte_count, Some(55555));
    }

    #[test]
    fn plain_frame_has_no_vbr_info() {
        let header = stereo_l3_header();
        let payload = vec![0u8; 200];
        assert!(detect_vbr_info(&header, &payload).is_none());
    }
}
