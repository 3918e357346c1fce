// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Cache key derivation.
//!
//! Two DJB2 variants, one per engine flavour:
//!
//! - **String**: the arguments are rendered as hex, scrambled (reverse,
//!   uppercase, `A-F` → `X`) and hashed with `h = (h << 5) - h + c` over
//!   32-bit signed wrapping arithmetic. The key is `|h|`, whose lowercase hex
//!   form never exceeds 8 characters.
//! - **Integer**: `h = h * 33 + v` seeded at 5381, folded over the raw
//!   arguments with 32-bit unsigned wrapping arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// DJB2 seed used by the integer derivation.
pub const DJB2_SEED: u32 = 5381;

/// Placeholder substituted for the hex letters `A-F` in the string derivation.
const HEX_LETTER_PLACEHOLDER: char = 'X';

/// Hash used to address the workload cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(u32);

impl CacheKey {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Slot index for a direct-mapped table of `capacity` entries.
    pub const fn slot(&self, capacity: usize) -> usize {
        self.0 as usize % capacity
    }

    /// Lowercase hex rendering, at most 8 characters.
    pub fn to_hex(&self) -> String {
        format!("{:x}", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Which DJB2 variant an engine derives its keys with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDerivation {
    String,
    Integer,
}

impl KeyDerivation {
    pub fn derive(&self, a: i32, b: i32) -> CacheKey {
        match self {
            Self::String => string_key(a, b),
            Self::Integer => integer_key(a, b),
        }
    }
}

/// Signed lowercase hex: negative values keep a leading `-` and print the
/// magnitude, so `-26` renders as `-1a`.
fn signed_hex(value: i32) -> String {
    if value < 0 {
        format!("-{:x}", value.unsigned_abs())
    } else {
        format!("{:x}", value)
    }
}

/// The scrambled string the string derivation hashes.
pub fn scramble(a: i32, b: i32) -> String {
    let joined = format!("{}_{}", signed_hex(a), signed_hex(b));
    joined
        .chars()
        .rev()
        .map(|c| c.to_ascii_uppercase())
        .map(|c| match c {
            'A'..='F' => HEX_LETTER_PLACEHOLDER,
            other => other,
        })
        .collect()
}

/// Rolling `(h << 5) - h + c` over a string, wrapped to `i32`.
pub fn rolling_hash(input: &str) -> i32 {
    input.chars().fold(0i32, |hash, c| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(c as i32)
    })
}

/// String-based derivation.
pub fn string_key(a: i32, b: i32) -> CacheKey {
    CacheKey(rolling_hash(&scramble(a, b)).unsigned_abs())
}

/// Integer-based derivation.
pub fn integer_key(a: i32, b: i32) -> CacheKey {
    let hash = [a, b].iter().fold(DJB2_SEED, |hash, &v| {
        hash.wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(v as u32)
    });
    CacheKey(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scramble() {
        // "a_ff" reversed is "ff_a", uppercased "FF_A", letters masked.
        assert_eq!(scramble(10, 255), "XX_X");
        assert_eq!(scramble(3, 4), "4_3");
        assert_eq!(scramble(-26, 1), "1_X1-");
    }

    #[test]
    fn test_rolling_hash_known_values() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("a"), 97);
        // 31 * 97 + 98
        assert_eq!(rolling_hash("ab"), 3105);
        // "4_3": ((52 * 31) + 95) * 31 + 51
        assert_eq!(rolling_hash("4_3"), 52968);
    }

    #[test]
    fn test_rolling_hash_wraps() {
        let long = "Z".repeat(64);
        // Must not panic on overflow and must stay deterministic.
        assert_eq!(rolling_hash(&long), rolling_hash(&long));
    }

    #[test]
    fn test_string_key_hex_fits_eight_chars() {
        for (a, b) in [(i32::MIN, i32::MIN), (i32::MAX, -1), (0, 0), (12345, -6789)] {
            let key = string_key(a, b);
            assert!(key.to_hex().len() <= 8);
        }
    }

    #[test]
    fn test_string_key_known_values() {
        assert_eq!(string_key(-26, 1).to_hex(), "2deff66");
        assert_eq!(string_key(3, 4).to_hex(), "cee8");
        assert_eq!(string_key(123456, -789).to_hex(), "6884c582");
        // "-80000000" keeps its sign through the scramble
        assert_eq!(scramble(i32::MIN, 255), "XX_00000008-");
        assert_eq!(string_key(i32::MIN, 255).to_hex(), "1cb2ea6");
    }

    #[test]
    fn test_integer_key_known_value() {
        // ((5381 * 33) + 3) * 33 + 4
        assert_eq!(integer_key(3, 4).value(), 5_860_012);
        assert_eq!(integer_key(3, 4).slot(1024), 5_860_012 % 1024);
    }

    #[test]
    fn test_integer_key_negative_wraps() {
        let key = integer_key(-1, 0);
        let expected = 5381u32
            .wrapping_mul(33)
            .wrapping_add(u32::MAX)
            .wrapping_mul(33);
        assert_eq!(key.value(), expected);
    }

    #[test]
    fn test_derivations_are_deterministic() {
        for derivation in [KeyDerivation::String, KeyDerivation::Integer] {
            assert_eq!(derivation.derive(7, 9), derivation.derive(7, 9));
            assert_ne!(derivation.derive(7, 9), derivation.derive(9, 7));
        }
    }
}
