//! `AL32UTF8` / `UTF8`: Oracle's UTF-8 variants. Decoding is standard UTF-8;
//! `AL32UTF8` differs from Oracle's older `UTF8` only in supplementary-plane
//! encoding, which is irrelevant to decoding already-valid bytes here.

use super::{BadChar, ByteCursor, CharacterSet};

pub struct Al32Utf8;

impl CharacterSet for Al32Utf8 {
    fn name(&self) -> &'static str {
        "AL32UTF8"
    }

    fn decode_next(&self, cursor: &mut ByteCursor<'_>) -> Result<char, BadChar> {
        let first = match cursor.peek(0) {
            Some(b) => b,
            None => return Err(BadChar::new(&[])),
        };

        let len = if first < 0x80 {
            1
        } else if first & 0xE0 == 0xC0 {
            2
        } else if first & 0xF0 == 0xE0 {
            3
        } else if first & 0xF8 == 0xF0 {
            4
        } else {
            cursor.advance(1);
            return Err(BadChar::new(&[first]));
        };

        let mut buf = [0u8; 4];
        for (i, slot) in buf.iter_mut().enumerate().take(len) {
            match cursor.peek(i) {
                Some(b) if i == 0 || (0x80..0xC0).contains(&b) => *slot = b,
                _ => {
                    let bad = (0..=i).filter_map(|j| cursor.peek(j)).collect::<Vec<_>>();
                    cursor.advance(i.max(1));
                    return Err(BadChar::new(&bad));
                }
            }
        }

        match std::str::from_utf8(&buf[..len]) {
            Ok(s) => {
                let c = s.chars().next().unwrap();
                cursor.advance(len);
                Ok(c)
            }
            Err(_) => {
                let bad = buf[..len].to_vec();
                cursor.advance(len);
                Err(BadChar::new(&bad))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii() {
        let mut c = ByteCursor::new(b"A");
        assert_eq!(Al32Utf8.decode_next(&mut c).unwrap(), 'A');
    }

    #[test]
    fn decodes_multibyte() {
        let bytes = "é".as_bytes();
        let mut c = ByteCursor::new(bytes);
        assert_eq!(Al32Utf8.decode_next(&mut c).unwrap(), 'é');
    }

    #[test]
    fn lossy_decode_substitutes_bad_bytes() {
        let data = [b'A', 0xff, b'B'];
        let out = Al32Utf8.decode_lossy(&data);
        assert_eq!(out, format!("A{}B", char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn truncated_sequence_is_bad_char() {
        let data = [0xE2, 0x82];
        let mut c = ByteCursor::new(&data);
        assert!(Al32Utf8.decode_next(&mut c).is_err());
    }

    proptest::proptest! {
        #[test]
        fn any_char_round_trips(ch in proptest::char::any()) {
            let mut buf = [0u8; 4];
            let encoded = ch.encode_utf8(&mut buf);
            let mut cursor = ByteCursor::new(encoded.as_bytes());
            let decoded = Al32Utf8.decode_next(&mut cursor).unwrap();
            proptest::prop_assert_eq!(decoded, ch);
            proptest::prop_assert_eq!(cursor.remaining(), 0);
        }
    }
}
