//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each host having a single token on the ring, each host has
//! `replicas` tokens (virtual nodes). This provides:
//!
//! 1. **Better Load Distribution**: more tokens per host smooth out the share
//!    of the key space each host owns
//! 2. **Gradual Rebalancing**: when a host joins or leaves, only the keys in
//!    its own vnode ranges move
//!
//! # Token Derivation
//!
//! The token of vnode `i` of host `name` is `partition(format!("{name}{i}"))`.
//! Derivation is deterministic, so unregistration recomputes the same tokens
//! instead of storing them.
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(v) per host where v = replicas
//! - **Lookup**: O(log n) where n = total vnodes
//! - **Rebalancing**: O(k/n·v) keys move when a host joins or leaves

use crate::partitioner::Partitioner;
use crate::token::Token;

/// A virtual node on the hash ring.
///
/// # Invariants
///
/// - Every token on the ring belongs to exactly one host
/// - A host owns exactly `replicas` vnodes, minus any token that collided
///   with a vnode registered earlier by another host
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Token,

    /// Name of the host that owns this virtual node.
    pub host: String,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Token, host: impl Into<String>) -> Self {
        Self {
            token,
            host: host.into(),
        }
    }

    /// Create vnode number `index` for `host`.
    pub fn from_index(partitioner: &dyn Partitioner, host: &str, index: usize) -> Self {
        Self::new(vnode_token(partitioner, host, index), host)
    }

    #[inline]
    pub fn token(&self) -> Token {
        self.token
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u64 {
        self.token.distance_to(&other.token)
    }
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, host={})", self.token, self.host)
    }
}

/// Token of vnode `index` of `host`.
pub fn vnode_token(partitioner: &dyn Partitioner, host: &str, index: usize) -> Token {
    partitioner.partition(format!("{host}{index}").as_bytes())
}

/// All vnode tokens of `host`, in index order.
pub fn vnode_tokens<'a>(
    partitioner: &'a dyn Partitioner,
    host: &'a str,
    replicas: usize,
) -> impl Iterator<Item = Token> + 'a {
    (0..replicas).map(move |i| vnode_token(partitioner, host, i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::Xxh3Partitioner;

    #[test]
    fn test_vnode_from_index() {
        let vnode0 = VirtualNode::from_index(&Xxh3Partitioner, "127.0.0.1:8080", 0);
        let vnode1 = VirtualNode::from_index(&Xxh3Partitioner, "127.0.0.1:8080", 1);

        assert_ne!(vnode0.token(), vnode1.token());
        assert_eq!(vnode0.host(), vnode1.host());
    }

    #[test]
    fn test_vnode_tokens_are_deterministic() {
        let a: Vec<Token> = vnode_tokens(&Xxh3Partitioner, "host-a", 10).collect();
        let b: Vec<Token> = vnode_tokens(&Xxh3Partitioner, "host-a", 10).collect();
        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert_eq!(a[3], vnode_token(&Xxh3Partitioner, "host-a", 3));
    }

    #[test]
    fn test_vnode_ordering() {
        let vnode1 = VirtualNode::new(Token(100), "a");
        let vnode2 = VirtualNode::new(Token(200), "b");

        assert!(vnode1 < vnode2);
        assert_eq!(vnode1.distance_to(&vnode2), 100);
    }
}
