//! `US7ASCII`: 7-bit ASCII. Bytes with the high bit set are malformed.

use super::{BadChar, ByteCursor, CharacterSet};

pub struct Us7Ascii;

impl CharacterSet for Us7Ascii {
    fn name(&self) -> &'static str {
        "US7ASCII"
    }

    fn decode_next(&self, cursor: &mut ByteCursor<'_>) -> Result<char, BadChar> {
        match cursor.peek(0) {
            Some(b) if b < 0x80 => {
                cursor.advance(1);
                Ok(b as char)
            }
            Some(b) => {
                cursor.advance(1);
                Err(BadChar::new(&[b]))
            }
            None => Err(BadChar::new(&[])),
        }
    }
}
