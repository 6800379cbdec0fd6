//! Consistent hash ring implementation.
//!
//! The ring manages virtual-node positions and provides lookup operations
//! for finding the host responsible for a key, optionally subject to a
//! per-host load bound.

mod builder;
mod hash_ring;
mod reservation;

pub use builder::RingBuilder;
pub use hash_ring::HashRing;
pub use reservation::Reservation;
