// SPDX-License-Identifier: MPL-2.0

//! ID3v2 header recognition: marker + syncsafe size, nothing else.
//!
//! Grounded on `symphonia_metadata::id3v2::read_id3v2_header`: a 10-byte
//! header, `"ID3"` marker, and a 28-bit syncsafe (7 bits per byte) size
//! field giving the tag body length. Total span is `10 + size`; the
//! trailing footer some taggers write is accounted for by the original
//! encoder folding its 10 bytes into that same size field, per the ID3v2
//! spec, so no separate footer case is needed here.

use crate::error::Result;
use crate::io::WindowBuffer;

use super::{TagKind, TagSpan};

pub fn detect_id3v2(wb: &WindowBuffer, offset: u64) -> Result<Option<TagSpan>> {
    let mut header = [0u8; 10];
    let n = wb.read(offset, &mut header, 10)?;
    if n < 10 {
        return Ok(None);
    }

    if &header[0..3] != b"ID3" {
        return Ok(None);
    }

    // header[3..5] is the version; header[5] is flags. Both are irrelevant
    // to a length/skip-only reader.
    let size = read_syncsafe_u32(&header[6..10]);

    Ok(Some(TagSpan { kind: TagKind::Id3v2, offset, length: 10 + size as u64 }))
}

fn read_syncsafe_u32(bytes: &[u8]) -> u32 {
    ((bytes[0] as u32 & 0x7f) << 21)
        | ((bytes[1] as u32 & 0x7f) << 14)
        | ((bytes[2] as u32 & 0x7f) << 7)
        | (bytes[3] as u32 & 0x7f)
}
