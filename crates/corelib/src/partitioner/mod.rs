//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting keys into tokens
//! that can be placed on the hash ring.

pub mod crypto;
pub mod sip;
pub mod traits;
pub mod xxh3;

pub use self::crypto::Blake3Partitioner;
pub use self::sip::SipPartitioner;
pub use self::traits::Partitioner;
pub use self::xxh3::Xxh3Partitioner;
