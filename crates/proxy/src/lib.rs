//! Routing layer of the proxy.
//!
//! This crate composes the core [`HashRing`](corelib::HashRing) with
//! request forwarding:
//! - [`Router`] resolves a key to a host, reserves load capacity, forwards
//!   the request, and releases the reservation when the request completes
//! - [`Forwarder`] is the seam to the backend hosts; [`HttpForwarder`]
//!   speaks plain HTTP
//! - [`ProxyServer`] exposes the control endpoint over axum

pub mod error;
pub mod forward;
pub mod router;
pub mod server;

pub use error::{ForwardError, ProxyError};
pub use forward::{Forwarder, HttpForwarder};
pub use router::Router;
pub use server::ProxyServer;
