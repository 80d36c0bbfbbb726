//! Deterministic content hashing.
//!
//! `sha256_hex` names fingerprints; `fast_hash` is a 32-bit FNV-1a for
//! internal bucketing where collision resistance does not matter.

use sha2::{Digest, Sha256};

const FNV_OFFSET_BASIS_32: u32 = 0x811c_9dc5;
const FNV_PRIME_32: u32 = 0x0100_0193;

/// SHA-256 of `data` as 64 lower-case hex characters.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// 32-bit FNV-1a over the bytes of `data`. Keys the pointer-entropy grid
/// buckets in `core::features`.
pub fn fast_hash(data: impl AsRef<[u8]>) -> u32 {
    data.as_ref().iter().fold(FNV_OFFSET_BASIS_32, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME_32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_deterministic_and_fixed_length() {
        for input in ["", "canvas", "a much longer input with spaces and ünïcode"] {
            let first = sha256_hex(input);
            let second = sha256_hex(input);
            assert_eq!(first, second);
            assert_eq!(first.len(), 64);
            assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_sha256_distinct_inputs() {
        assert_ne!(sha256_hex("Arial,Helvetica"), sha256_hex("Arial,Helvetica "));
    }

    #[test]
    fn test_fast_hash_known_vectors() {
        assert_eq!(fast_hash(""), 0x811c_9dc5);
        assert_eq!(fast_hash("a"), 0xe40c_292c);
        assert_eq!(fast_hash("foobar"), 0xbf9c_f968);
    }
}
