//! Example backend host.
//!
//! Answers `GET /?key=K` with `hello: K`, caching each answer for a fixed
//! time-to-live. On startup the host registers itself with the proxy's
//! control endpoint and unregisters on graceful shutdown.

pub mod cache;
pub mod control;
pub mod error;
pub mod server;

pub use cache::ExpiringCache;
pub use control::ControlClient;
pub use error::BackendError;
pub use server::{BackendConfig, BackendServer};
