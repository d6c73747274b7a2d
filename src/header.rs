// SPDX-License-Identifier: MPL-2.0

//! MPEG audio frame header parsing.
//!
//! Grounded on `symphonia_bundle_mp3::header` (`check_header`,
//! `is_frame_header_word_synced`, `parse_frame_header`) and
//! `symphonia_bundle_mp3::common` (bitrate tables, `side_info_len`,
//! `duration`/`n_granules`), generalized to accept `bit_rate_index == 0`
//! (free format) instead of rejecting it as unsupported.

/// MPEG audio version.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg2p5,
    Mpeg2,
    Mpeg1,
}

/// MPEG audio layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MpegLayer {
    Layer1,
    Layer2,
    Layer3,
}

/// Channel mode. Only the channel *count* matters to this reader; the exact
/// stereo coding mode is decoder territory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    Mono,
    DualMono,
    Stereo,
    JointStereo,
}

impl ChannelMode {
    pub fn channel_count(self) -> u32 {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }
}

const BIT_RATES_MPEG1_L1: [u32; 16] = [
    0, 32_000, 64_000, 96_000, 128_000, 160_000, 192_000, 224_000, 256_000, 288_000, 320_000,
    352_000, 384_000, 416_000, 448_000, 0,
];
const BIT_RATES_MPEG1_L2: [u32; 16] = [
    0, 32_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 160_000, 192_000,
    224_000, 256_000, 320_000, 384_000, 0,
];
const BIT_RATES_MPEG1_L3: [u32; 16] = [
    0, 32_000, 40_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 160_000,
    192_000, 224_000, 256_000, 320_000, 0,
];
const BIT_RATES_MPEG2_L1: [u32; 16] = [
    0, 32_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000, 128_000, 144_000, 160_000,
    176_000, 192_000, 224_000, 256_000, 0,
];
const BIT_RATES_MPEG2_L23: [u32; 16] = [
    0, 8_000, 16_000, 24_000, 32_000, 40_000, 48_000, 56_000, 64_000, 80_000, 96_000, 112_000,
    128_000, 144_000, 160_000, 0,
];

/// Quick, cheap check of whether a candidate header word could possibly be
/// valid, without yet computing a frame length. Used to raise confidence
/// before spending more effort on a resync candidate.
#[inline]
pub fn check_header(header: u32) -> bool {
    if (header >> 19) & 0x3 == 0x1 {
        return false; // reserved version
    }
    if (header >> 17) & 0x3 == 0x0 {
        return false; // reserved layer
    }
    if (header >> 12) & 0xf == 0xf {
        return false; // bad bit-rate index
    }
    if (header >> 10) & 0x3 == 0x3 {
        return false; // reserved sample rate
    }
    true
}

/// Returns true if the top 11 bits of `word` are the sync pattern.
#[inline(always)]
pub fn is_sync_word(word: u32) -> bool {
    (word & 0xffe0_0000) == 0xffe0_0000
}

/// A parsed MPEG audio frame header. `frame_length` is `None` for free-format
/// frames (`bit_rate_index == 0`); their length is recovered post hoc by the
/// scanner from the position of the next sync.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    pub channel_mode: ChannelMode,
    pub sample_rate: u32,
    pub bit_rate_index: u8,
    pub bit_rate: u32,
    pub has_padding: bool,
    /// Length in bytes of the frame including its 4-byte header, or `None`
    /// for a free-format frame.
    pub frame_length: Option<usize>,
}

impl FrameHeader {
    pub fn is_free_format(&self) -> bool {
        self.bit_rate_index == 0
    }

    /// Number of granules encoded in this frame.
    pub fn n_granules(&self) -> u32 {
        match self.version {
            MpegVersion::Mpeg1 => 2,
            _ => 1,
        }
    }

    /// Number of PCM samples per channel this frame produces.
    pub fn sample_count(&self) -> u32 {
        match self.layer {
            MpegLayer::Layer1 => 384,
            MpegLayer::Layer2 => 1152,
            MpegLayer::Layer3 => 576 * self.n_granules(),
        }
    }

    /// Length of the side-information block following the 4-byte header,
    /// used to locate a Xing/Info/VBRI token. See `symphonia_bundle_mp3`'s
    /// `FrameHeader::side_info_len`.
    pub fn side_info_len(&self) -> usize {
        match (self.version, self.channel_mode) {
            (MpegVersion::Mpeg1, ChannelMode::Mono) => 17,
            (MpegVersion::Mpeg1, _) => 32,
            (_, ChannelMode::Mono) => 9,
            (_, _) => 17,
        }
    }
}

/// Parses a 32-bit big-endian MPEG frame header word. Does not validate that
/// `header` is actually synced (callers are expected to have checked that
/// already, e.g. via [`is_sync_word`] and [`check_header`]).
///
/// Returns `None` for a structurally invalid header (reserved version,
/// layer, sample-rate index, or an invalid Layer II bit-rate/channel
/// combination). A free-format frame (`bit_rate_index == 0`) is returned
/// with `frame_length: None`, not rejected.
pub fn parse_frame_header(header: u32) -> Option<FrameHeader> {
    if !check_header(header) {
        return None;
    }

    let version = match (header >> 19) & 0x3 {
        0b00 => MpegVersion::Mpeg2p5,
        0b10 => MpegVersion::Mpeg2,
        0b11 => MpegVersion::Mpeg1,
        _ => return None,
    };

    let layer = match (header >> 17) & 0x3 {
        0b01 => MpegLayer::Layer3,
        0b10 => MpegLayer::Layer2,
        0b11 => MpegLayer::Layer1,
        _ => return None,
    };

    let bit_rate_index = ((header >> 12) & 0xf) as u8;

    let bit_rate = match (bit_rate_index, version, layer) {
        (0, _, _) => 0, // free format; resolved post hoc
        (i, MpegVersion::Mpeg1, MpegLayer::Layer1) => BIT_RATES_MPEG1_L1[i as usize],
        (i, MpegVersion::Mpeg1, MpegLayer::Layer2) => BIT_RATES_MPEG1_L2[i as usize],
        (i, MpegVersion::Mpeg1, MpegLayer::Layer3) => BIT_RATES_MPEG1_L3[i as usize],
        (i, _, MpegLayer::Layer1) => BIT_RATES_MPEG2_L1[i as usize],
        (i, _, _) => BIT_RATES_MPEG2_L23[i as usize],
    };

    let sample_rate = match ((header >> 10) & 0x3, version) {
        (0b00, MpegVersion::Mpeg1) => 44_100,
        (0b01, MpegVersion::Mpeg1) => 48_000,
        (0b10, MpegVersion::Mpeg1) => 32_000,
        (0b00, MpegVersion::Mpeg2) => 22_050,
        (0b01, MpegVersion::Mpeg2) => 24_000,
        (0b10, MpegVersion::Mpeg2) => 16_000,
        (0b00, MpegVersion::Mpeg2p5) => 11_025,
        (0b01, MpegVersion::Mpeg2p5) => 12_000,
        (0b10, MpegVersion::Mpeg2p5) => 8_000,
        _ => return None,
    };

    let channel_mode = match (header >> 6) & 0x3 {
        0b00 => ChannelMode::Stereo,
        0b01 => ChannelMode::JointStereo,
        0b10 => ChannelMode::DualMono,
        0b11 => ChannelMode::Mono,
        _ => unreachable!(),
    };

    if layer == MpegLayer::Layer2 && bit_rate_index != 0 {
        let invalid = match channel_mode {
            ChannelMode::Mono => {
                matches!(bit_rate, 224_000 | 256_000 | 320_000 | 384_000)
            }
            _ => matches!(bit_rate, 32_000 | 48_000 | 56_000 | 80_000),
        };
        if invalid {
            return None;
        }
    }

    let has_padding = header & 0x200 != 0;

    let frame_length = if bit_rate_index == 0 {
        None
    } else {
        Some(compute_frame_length(layer, version, bit_rate, sample_rate, has_padding))
    };

    Some(FrameHeader {
        version,
        layer,
        channel_mode,
        sample_rate,
        bit_rate_index,
        bit_rate,
        has_padding,
        frame_length,
    })
}

fn compute_frame_length(
    layer: MpegLayer,
    version: MpegVersion,
    bit_rate: u32,
    sample_rate: u32,
    has_padding: bool,
) -> usize {
    // ISO/IEC 11172-3 section 2.4.3.1.
    let factor = match layer {
        MpegLayer::Layer1 => 12,
        MpegLayer::Layer2 => 144,
        MpegLayer::Layer3 if version == MpegVersion::Mpeg1 => 144,
        MpegLayer::Layer3 => 72,
    };

    let slot_size = match layer {
        MpegLayer::Layer1 => 4,
        _ => 1,
    };

    let slots = (factor * bit_rate / sample_rate) as usize + usize::from(has_padding);
    slots * slot_size
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 44.1 kHz, 128 kbps, stereo, Layer III, MPEG1, no-padding header.
    const MP1_L3_128_441_STEREO: u32 = 0xFFFB_9064;

    #[test]
    fn parses_cbr_layer3_header() {
        let header = parse_frame_header(MP1_L3_128_441_STEREO).unwrap();
        assert_eq!(header.version, MpegVersion::Mpeg1);
        assert_eq!(header.layer, MpegLayer::Layer3);
        assert_eq!(header.sample_rate, 44_100);
        assert_eq!(header.channel_mode.channel_count(), 2);
        assert_eq!(header.bit_rate, 128_000);
        assert_eq!(header.frame_length, Some(417));
        assert_eq!(header.sample_count(), 1152);
    }

    #[test]
    fn padding_bit_adds_one_byte() {
        let padded = MP1_L3_128_441_STEREO | 0x200;
        let header = parse_frame_header(padded).unwrap();
        assert_eq!(header.frame_length, Some(418));
    }

    #[test]
    fn free_format_has_no_length() {
        let free = MP1_L3_128_441_STEREO & !0xf000;
        let header = parse_frame_header(free).unwrap();
        assert!(header.is_free_format());
        assert_eq!(header.frame_length, None);
    }

    #[test]
    fn rejects_reserved_version() {
        let bad = (MP1_L3_128_441_STEREO & !0x18_0000) | 0x8_0000;
        assert!(parse_frame_header(bad).is_none());
    }

    #[test]
    fn sync_word_detection() {
        assert!(is_sync_word(MP1_L3_128_441_STEREO));
        assert!(!is_sync_word(0x0000_0000));
    }
}
