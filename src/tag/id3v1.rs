// SPDX-License-Identifier: MPL-2.0

//! ID3v1 trailer recognition: `"TAG"` marker, fixed 128-byte length.
//!
//! Grounded on `symphonia_metadata::id3v1`: the tag has no internal length
//! field, it is always exactly 128 bytes, sitting at the last 128 bytes of
//! the stream.

use crate::error::Result;
use crate::io::WindowBuffer;

use super::{TagKind, TagSpan};

pub const ID3V1_LEN: u64 = 128;

pub fn detect_id3v1(wb: &WindowBuffer, offset: u64) -> Result<Option<TagSpan>> {
    let mut marker = [0u8; 3];
    let n = wb.read(offset, &mut marker, 3)?;
    if n < 3 || &marker != b"TAG" {
        return Ok(None);
    }
    Ok(Some(TagSpan { kind: TagKind::Id3v1, offset, length: ID3V1_LEN }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderOptions;
    use std::io::Cursor;

    #[test]
    fn recognizes_tag_marker() {
        let mut data = b"TAG".to_vec();
        data.extend(std::iter::repeat(0u8).take(125));
        let wb = WindowBuffer::new(Box::new(Cursor::new(data)), &ReaderOptions::default());
        let span = detect_id3v1(&wb, 0).unwrap().unwrap();
        assert_eq!(span.length, 128);
    }

    #[test]
    fn rejects_missing_marker() {
        let data = vec![0u8; 128];
        let wb = WindowBuffer::new(Box::new(Cursor::new(data)), &ReaderOptions::default());
        assert!(detect_id3v1(&wb, 0).unwrap().is_none());
    }
}
