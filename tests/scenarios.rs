// SPDX-License-Identifier: MPL-2.0

//! End-to-end scenarios over synthetic, in-memory MPEG streams.

use std::io::Cursor;

use mpeg_audio_reader::{ForwardOnly, MpegReader, ReaderError};

const MP1_L3_128_441_STEREO: u32 = 0xFFFB_9064;

fn cbr_frame() -> Vec<u8> {
    let mut frame = vec![0u8; 417];
    frame[0..4].copy_from_slice(&MP1_L3_128_441_STEREO.to_be_bytes());
    frame
}

fn cbr_stream(n: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for _ in 0..n {
        data.extend(cbr_frame());
    }
    data
}

fn id3v2_tag(body_len: u32) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(b"ID3");
    v.extend_from_slice(&[4, 0, 0]);
    v.push(((body_len >> 21) & 0x7f) as u8);
    v.push(((body_len >> 14) & 0x7f) as u8);
    v.push(((body_len >> 7) & 0x7f) as u8);
    v.push((body_len & 0x7f) as u8);
    v.extend(std::iter::repeat(0u8).take(body_len as usize));
    v
}

fn id3v1_tag() -> Vec<u8> {
    let mut v = b"TAG".to_vec();
    v.extend(std::iter::repeat(0u8).take(125));
    v
}

/// S1: a plain CBR stream reports accurate static properties from construction.
#[test]
fn s1_plain_cbr_stream_reports_static_properties() {
    let data = cbr_stream(8);
    let reader = MpegReader::new(Box::new(Cursor::new(data))).unwrap();

    assert_eq!(reader.sample_rate(), 44_100);
    assert_eq!(reader.channels(), 2);
    assert_eq!(reader.first_frame_sample_count(), 1152);
    assert_eq!(reader.sample_count(), -1); // unresolved until the stream is walked

    reader.read_to_end().unwrap();
    assert_eq!(reader.sample_count(), 8 * 1152);
}

/// S2: a leading ID3v2 tag and a trailing ID3v1 tag are both skipped, and
/// only audio frames are yielded through `next_frame`.
#[test]
fn s2_id3_prefix_and_suffix_are_skipped() {
    let mut data = id3v2_tag(40);
    data.extend(cbr_stream(3));
    data.extend(id3v1_tag());

    let reader = MpegReader::new(Box::new(Cursor::new(data))).unwrap();

    let mut count = 0;
    while let Some(frame) = reader.next_frame().unwrap() {
        assert_eq!(frame.sample_rate, 44_100);
        count += 1;
    }
    assert_eq!(count, 3);
}

/// S3: an ID3v2 tag followed by a Xing-tagged VBR header frame resolves
/// `sample_count` from the Xing frame count. The Xing frame is silent
/// side-info, not audio, so it is never catalogued — the first catalog
/// entry (number 0) is the real audio frame right after it.
#[test]
fn s3_id3v2_plus_xing_header_resolves_sample_count() {
    let mut xing_frame = cbr_frame();
    // side info for MPEG1 stereo is 32 bytes; place "Xing" right after it.
    let tag_offset = 4 + 32;
    xing_frame[tag_offset..tag_offset + 4].copy_from_slice(b"Xing");
    xing_frame[tag_offset + 4..tag_offset + 8].copy_from_slice(&0x1u32.to_be_bytes()); // FRAMES flag
    xing_frame[tag_offset + 8..tag_offset + 12].copy_from_slice(&100u32.to_be_bytes());

    let mut data = id3v2_tag(10);
    data.extend(xing_frame);
    data.extend(cbr_stream(2));

    let reader = MpegReader::new(Box::new(Cursor::new(data))).unwrap();
    assert_eq!(reader.sample_count(), 100 * 1152);

    let first = reader.next_frame().unwrap().unwrap();
    assert_eq!(first.number, 0);
    assert_eq!(first.offset, id3v2_tag(10).len() as u64 + 417); // past the id3 tag and the skipped Xing frame
}

/// S4: a run of corrupted bytes before the first valid sync is skipped, and
/// catalog construction still succeeds once two valid frames are found.
#[test]
fn s4_corrupted_prefix_is_resynced_past() {
    let mut data = vec![0x55u8; 61];
    data.extend(cbr_stream(2));

    let reader = MpegReader::new(Box::new(Cursor::new(data))).unwrap();
    assert_eq!(reader.sample_rate(), 44_100);
}

/// S5a: a free-format frame's length is resolved once the next sync is
/// found, on a seekable source.
#[test]
fn s5a_free_format_length_resolves_on_seekable_source() {
    let mut data = Vec::new();
    let mut free_header = MP1_L3_128_441_STEREO.to_be_bytes();
    free_header[2] &= 0x0f;
    data.extend_from_slice(&free_header);
    data.extend(std::iter::repeat(0u8).take(300));
    data.extend(cbr_frame());
    data.extend(cbr_frame());

    let reader = MpegReader::new(Box::new(Cursor::new(data))).unwrap();
    let first = reader.next_frame().unwrap().unwrap();
    assert!(first.is_length_resolved());
    assert_eq!(first.frame_length(), 304);
}

/// S5b: the same free-format stream on a forward-only source that never
/// resolves within the search limit surfaces `FreeFormatRequiresSeek`.
#[test]
fn s5b_free_format_requires_seek_on_forward_only_source() {
    let mut data = Vec::new();
    let mut free_header = MP1_L3_128_441_STEREO.to_be_bytes();
    free_header[2] &= 0x0f;
    data.extend_from_slice(&free_header);
    data.extend(std::iter::repeat(0u8).take(64 * 1024));

    let err = MpegReader::new(Box::new(ForwardOnly::new(Cursor::new(data)))).unwrap_err();
    assert!(matches!(err, ReaderError::NotAValidMpegStream | ReaderError::FreeFormatRequiresSeek));
}

/// S6: a layer change between two CBR (non-free-format) frames is admitted
/// as an ordinary frame, since the format-mismatch guard is only active
/// while a free-format frame's length is unresolved.
#[test]
fn s6_layer_change_without_free_format_is_admitted() {
    let mut data = cbr_frame();

    // Layer II at the same bit-rate index (9): MPEG1/44.1kHz/stereo, but the
    // bit-rate table picks a different kbps for Layer II, so the frame is a
    // different length (522 bytes) than the Layer III frames around it.
    let mut layer2 = MP1_L3_128_441_STEREO;
    layer2 &= !(0x3 << 17);
    layer2 |= 0b10 << 17; // Layer II
    let mut layer2_frame = vec![0u8; 522];
    layer2_frame[0..4].copy_from_slice(&layer2.to_be_bytes());
    data.extend(layer2_frame);
    data.extend(cbr_frame());

    let reader = MpegReader::new(Box::new(Cursor::new(data))).unwrap();
    let first = reader.next_frame().unwrap().unwrap();
    let second = reader.next_frame().unwrap().unwrap();
    assert_ne!(first.layer, second.layer);
}
