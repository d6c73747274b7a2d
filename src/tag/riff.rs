// SPDX-License-Identifier: MPL-2.0

//! RIFF/WAVE container recognition: enough to skip past the `RIFF`/`RF64`
//! header and its chunk list down to the start of the `data` chunk's
//! payload, where MPEG frames begin in an MPEG-in-WAV stream.
//!
//! Grounded on `symphonia_format_riff::wave`: a `RIFF`/`RF64` marker, a
//! 4-byte little-endian chunk size, a `WAVE` form type, then a flat list of
//! `{id[4], size[4]}` chunks (each padded to an even length) until `data`.

use crate::error::Result;
use crate::io::WindowBuffer;

use super::{TagKind, TagSpan};

const CHUNK_HEADER_LEN: u64 = 8;
/// Safety bound on how many chunks precede `data` before giving up; a
/// well-formed WAVE file has a handful (fmt, fact, LIST, ...).
const MAX_CHUNKS: u32 = 64;

pub fn detect_riff(wb: &WindowBuffer, offset: u64) -> Result<Option<TagSpan>> {
    let mut marker = [0u8; 4];
    if wb.read(offset, &mut marker, 4)? < 4 {
        return Ok(None);
    }
    if &marker != b"RIFF" && &marker != b"RF64" {
        return Ok(None);
    }

    let mut form = [0u8; 4];
    if wb.read(offset + 8, &mut form, 4)? < 4 || &form != b"WAVE" {
        return Ok(None);
    }

    let mut cursor = offset + 12;
    for _ in 0..MAX_CHUNKS {
        let mut chunk_header = [0u8; 8];
        if wb.read(cursor, &mut chunk_header, 8)? < 8 {
            // Ran out of buffered bytes before finding `data`; not resolvable
            // as a length/skip span from here.
            return Ok(None);
        }

        let id = &chunk_header[0..4];
        let size = u32::from_le_bytes(chunk_header[4..8].try_into().unwrap()) as u64;

        if id == b"data" {
            let length = (cursor + CHUNK_HEADER_LEN) - offset;
            return Ok(Some(TagSpan { kind: TagKind::Riff, offset, length }));
        }

        let padded = size + (size & 1);
        cursor += CHUNK_HEADER_LEN + padded;
    }

    Ok(None)
}
