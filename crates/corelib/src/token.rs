//! Ring positions.
//!
//! A token is a point on the `u64` hash ring. Keys and virtual nodes are both
//! hashed into tokens by a [`Partitioner`](crate::partitioner::Partitioner);
//! a key is owned by the first virtual node whose token is `>=` the key's.

use std::fmt;

/// Position on the hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Token(pub u64);

impl Token {
    /// Clockwise distance from `self` to `other` on the ring.
    ///
    /// Wraps through `u64::MAX` when `other` sits before `self`.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u64 {
        other.0.wrapping_sub(self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
