//! Forwarding abstraction.
//!
//! A forwarder delivers one keyed request to a resolved host and returns the
//! raw response body. Transport concerns (connection reuse, timeouts) live
//! behind this trait, not in the router.

pub mod http;

pub use self::http::HttpForwarder;

use async_trait::async_trait;

use crate::error::ForwardError;

/// Delivers a keyed request to a backend host.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync) as one instance is
/// shared by every request handler.
#[async_trait]
pub trait Forwarder: Send + Sync + 'static {
    /// Send `key` to `host` (an address such as `10.0.0.7:8080`) and return
    /// the response body.
    async fn forward(&self, host: &str, key: &str) -> Result<String, ForwardError>;

    /// Forwarder name (for logging/debugging).
    fn name(&self) -> &'static str;
}
