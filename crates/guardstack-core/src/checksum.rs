//! Non-cryptographic 64-bit fingerprint over byte regions.
//!
//! Each of the eight output bytes is an independent Pearson-style pass over
//! the input, salted with its byte position. The result detects accidental
//! corruption only; it is trivially forgeable.

/// Odd constant mixed into every step of a pass.
pub const MIX: u8 = 89;

/// Fingerprint `data`. Empty input hashes to 0.
#[must_use]
pub fn hash64(data: &[u8]) -> u64 {
    let Some((&first, rest)) = data.split_first() else {
        return 0;
    };
    let mut acc = data.len() as u64;
    for j in 0..8u8 {
        let mut h = first.wrapping_add(j) ^ MIX;
        for &b in rest {
            h = (h ^ b) ^ MIX;
        }
        acc = (acc << 8) | u64::from(h);
    }
    acc
}
