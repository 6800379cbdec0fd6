//! Core partitioner trait definitions.

use crate::token::Token;

/// A partitioner converts keys into tokens for placement on the hash ring.
///
/// Partitioners are stateless and thread-safe, allowing concurrent
/// token generation without synchronization overhead. Any function that
/// spreads its output uniformly over `u64` is acceptable.
pub trait Partitioner: Send + Sync + 'static {
    /// Converts a key into a token.
    fn partition(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}

impl<F> Partitioner for F
where
    F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
{
    fn partition(&self, key: &[u8]) -> Token {
        Token(self(key))
    }

    fn name(&self) -> &'static str {
        "CustomPartitioner"
    }
}
