//! BLAKE3 partitioner implementation.

use crate::partitioner::traits::Partitioner;
use crate::token::Token;

/// Cryptographic partitioner: the first eight bytes of the BLAKE3 digest,
/// little endian.
///
/// Slower than [`Xxh3Partitioner`](super::Xxh3Partitioner); useful when host
/// names or keys are attacker-controlled.
#[derive(Clone, Debug, Default)]
pub struct Blake3Partitioner;

impl Partitioner for Blake3Partitioner {
    fn partition(&self, key: &[u8]) -> Token {
        let digest = ::blake3::hash(key);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        Token(u64::from_le_bytes(head))
    }

    fn name(&self) -> &'static str {
        "Blake3Partitioner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::{SipPartitioner, Xxh3Partitioner};

    #[test]
    fn test_partitioners_are_deterministic() {
        let parts: [&dyn Partitioner; 3] =
            [&Xxh3Partitioner, &SipPartitioner, &Blake3Partitioner];
        for p in parts {
            assert_eq!(p.partition(b"key"), p.partition(b"key"), "{}", p.name());
            assert_ne!(p.partition(b"key"), p.partition(b"kez"), "{}", p.name());
        }
    }

    #[test]
    fn test_closure_partitioner() {
        let p = |key: &[u8]| key.len() as u64;
        assert_eq!(p.partition(b"abc"), Token(3));
        assert_eq!(Partitioner::name(&p), "CustomPartitioner");
    }
}
