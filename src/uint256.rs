//! Fixed-width 256-bit unsigned integer.
//!
//! Used for the wide flag columns in the replicated data dictionary
//! (`SYS.OBJ$.FLAGS`, `SYS.TAB$.PROPERTY`) that don't fit a `u64`. Stored
//! as four little-endian `u64` limbs; only the operations the dictionary
//! rows need are implemented — this is not a general bignum type.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Uint256 {
    limbs: [u64; 4],
}

impl Uint256 {
    pub const ZERO: Uint256 = Uint256 { limbs: [0; 4] };

    pub const fn from_u64(v: u64) -> Self {
        Uint256 {
            limbs: [v, 0, 0, 0],
        }
    }

    pub const fn from_limbs_le(limbs: [u64; 4]) -> Self {
        Uint256 { limbs }
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let start = i * 8;
            if start >= bytes.len() {
                break;
            }
            let end = (start + 8).min(bytes.len());
            let mut buf = [0u8; 8];
            buf[..end - start].copy_from_slice(&bytes[start..end]);
            *limb = u64::from_le_bytes(buf);
        }
        Uint256 { limbs }
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }

    pub fn checked_add(&self, other: &Uint256) -> Option<Uint256> {
        let mut out = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let sum = self.limbs[i] as u128 + other.limbs[i] as u128 + carry;
            out[i] = sum as u64;
            carry = sum >> 64;
        }
        if carry != 0 {
            None
        } else {
            Some(Uint256 { limbs: out })
        }
    }

    pub fn checked_sub(&self, other: &Uint256) -> Option<Uint256> {
        if *self < *other {
            return None;
        }
        let mut out = [0u64; 4];
        let mut borrow = 0i128;
        for i in 0..4 {
            let diff = self.limbs[i] as i128 - other.limbs[i] as i128 - borrow;
            if diff < 0 {
                out[i] = (diff + (1i128 << 64)) as u64;
                borrow = 1;
            } else {
                out[i] = diff as u64;
                borrow = 0;
            }
        }
        Some(Uint256 { limbs: out })
    }
}

impl PartialOrd for Uint256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uint256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..4).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

/// Base-10 string rendering via repeated divide-by-10 over the limb array,
/// mirroring the source's digit-table long-division approach.
impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut limbs = self.limbs;
        let mut digits = Vec::new();
        while limbs.iter().any(|&l| l != 0) {
            let mut remainder: u128 = 0;
            for limb in limbs.iter_mut().rev() {
                let acc = (remainder << 64) | *limb as u128;
                *limb = (acc / 10) as u64;
                remainder = acc % 10;
            }
            digits.push(b'0' + remainder as u8);
        }
        digits.reverse();
        f.write_str(std::str::from_utf8(&digits).unwrap())
    }
}
