//! `WE8ISO8859P1`: Latin-1. Every byte maps directly to the Unicode code
//! point of the same value, so decoding can never fail.

use super::{BadChar, ByteCursor, CharacterSet};

pub struct We8Iso8859P1;

impl CharacterSet for We8Iso8859P1 {
    fn name(&self) -> &'static str {
        "WE8ISO8859P1"
    }

    fn decode_next(&self, cursor: &mut ByteCursor<'_>) -> Result<char, BadChar> {
        match cursor.peek(0) {
            Some(b) => {
                cursor.advance(1);
                Ok(b as char)
            }
            None => Err(BadChar::new(&[])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_bytes_map_to_latin1_block() {
        let data = [0xE9u8];
        let mut c = ByteCursor::new(&data);
        assert_eq!(We8Iso8859P1.decode_next(&mut c).unwrap(), 'é');
    }
}
