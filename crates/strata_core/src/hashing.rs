//! # Raw Key Hashing
//!
//! Hash tables in this crate hash and compare keys by their raw bytes.
//! Keys are therefore restricted to [`Pod`] types: integers, floats, arrays
//! of those, and `#[repr(C)]` structs without padding.
//!
//! Note that float keys compare bitwise: `0.0` and `-0.0` are different keys
//! and a NaN key finds itself.

use bytemuck::Pod;

/// Jenkins one-at-a-time hash over `bytes`.
///
/// Not cryptographic. Fast enough for the small fixed-width keys used here
/// and has good avalanche for a byte-wise hash.
#[inline]
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0;
    for &byte in bytes {
        hash = hash.wrapping_add(u32::from(byte));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

/// Hashes the raw byte representation of `key`.
#[inline]
#[must_use]
pub fn hash_key<K: Pod>(key: &K) -> u32 {
    hash_bytes(bytemuck::bytes_of(key))
}

/// Bitwise key equality, consistent with [`hash_key`].
#[inline]
#[must_use]
pub fn keys_equal<K: Pod>(a: &K, b: &K) -> bool {
    bytemuck::bytes_of(a) == bytemuck::bytes_of(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_hashes_to_zero() {
        assert_eq!(hash_bytes(&[]), 0);
    }

    #[test]
    fn test_known_vector() {
        // Reference value for the one-at-a-time hash of "a".
        assert_eq!(hash_bytes(b"a"), 0xCA2E_9442);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let key = [3u32, 1, 4];
        assert_eq!(hash_key(&key), hash_key(&[3u32, 1, 4]));
        assert_ne!(hash_key(&key), hash_key(&[4u32, 1, 3]));
    }

    #[test]
    fn test_float_keys_compare_bitwise() {
        assert!(keys_equal(&f32::NAN, &f32::NAN));
        assert!(!keys_equal(&0.0f32, &-0.0f32));
    }
}
