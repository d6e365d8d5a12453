//! Blake2b hashing for payloads and arbitrary data.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::Serialize;
use tide_types::Digest32;

use crate::error::CryptoError;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Digest of a submission payload: Blake2b over its bincode encoding.
///
/// Oracle votes are tallied by this digest, so two submissions count together
/// only when every field is identical.
pub fn payload_digest<T: Serialize>(payload: &T) -> Result<Digest32, CryptoError> {
    let bytes =
        bincode::serialize(payload).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    Ok(Digest32::new(blake2b_256(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"hello tide"), blake2b_256(b"hello tide"));
    }

    #[test]
    fn blake2b_different_inputs() {
        assert_ne!(blake2b_256(b"hello"), blake2b_256(b"world"));
    }

    #[test]
    fn multi_matches_concatenation() {
        assert_eq!(
            blake2b_256_multi(&[b"hello ", b"tide"]),
            blake2b_256(b"hello tide")
        );
    }

    #[test]
    fn payload_digest_distinguishes_fields() {
        let a = payload_digest(&(1u64, 2u128)).unwrap();
        let b = payload_digest(&(1u64, 3u128)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, payload_digest(&(1u64, 2u128)).unwrap());
    }
}
