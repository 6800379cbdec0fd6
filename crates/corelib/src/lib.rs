//! Core library for bounded-load consistent hashing.
//!
//! This crate provides the routing core of the proxy:
//! - Tokens and partitioners (key hashing)
//! - Virtual nodes and the sorted hash ring
//! - Bounded-load host selection
//! - Per-host and aggregate in-flight load accounting

pub mod config;
pub mod error;
pub mod host;
pub mod load;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod vnode;

pub use config::{HashAlgorithm, RingConfig};
pub use error::{Error, Result};
pub use host::Host;
pub use load::{LoadSnapshot, LoadTracker};
pub use partitioner::Partitioner;
pub use ring::{HashRing, Reservation, RingBuilder};
pub use token::Token;
pub use vnode::VirtualNode;
