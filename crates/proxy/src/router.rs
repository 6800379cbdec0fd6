//! Key routing with load reservation.
//!
//! # Algorithm
//!
//! 1. Resolve the key on the ring (plain or bounded-load)
//! 2. For bounded-load lookups, reserve one unit of load on the chosen host
//! 3. Forward the request and hand back the raw body
//! 4. Release the reservation when the forwarded call returns, on success,
//!    failure, or cancellation alike

use std::sync::Arc;
use std::time::Instant;

use corelib::HashRing;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::error::ProxyError;
use crate::forward::{Forwarder, HttpForwarder};

/// Routes keyed requests to hosts on a shared [`HashRing`].
///
/// The ring is passed in, not owned globally, so several independent
/// routers can coexist (one per test, for instance).
pub struct Router<F = HttpForwarder> {
    ring: Arc<HashRing>,
    forwarder: F,
}

impl<F: Forwarder> Router<F> {
    pub fn new(ring: Arc<HashRing>, forwarder: F) -> Self {
        Self { ring, forwarder }
    }

    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }

    pub fn forwarder(&self) -> &F {
        &self.forwarder
    }

    pub fn register_host(&self, host: &str) -> Result<(), ProxyError> {
        self.ring.register_host(host)?;
        info!(host, "register host: {host} success");
        Ok(())
    }

    pub fn unregister_host(&self, host: &str) -> Result<(), ProxyError> {
        self.ring.unregister_host(host)?;
        info!(host, "unregister host: {host} success");
        Ok(())
    }

    /// Forward `key` to its owning host. No load accounting.
    pub async fn get_host(&self, key: &str) -> Result<String, ProxyError> {
        counter!("proxy_requests_total", "route" => "host").increment(1);
        let host = self.ring.get_host(key)?;
        self.forward("host", &host, key).await
    }

    /// Forward `key` to a host with spare capacity, holding a load
    /// reservation on it for the duration of the forwarded call.
    pub async fn get_host_capacious(&self, key: &str) -> Result<String, ProxyError> {
        counter!("proxy_requests_total", "route" => "host_capacious").increment(1);
        let reservation = self.ring.reserve(key)?;
        let host = reservation.host().to_string();
        let result = self.forward("host_capacious", &host, key).await;
        drop(reservation);
        result
    }

    async fn forward(&self, route: &'static str, host: &str, key: &str) -> Result<String, ProxyError> {
        let started = Instant::now();
        let result = self.forwarder.forward(host, key).await;
        histogram!("proxy_forward_seconds", "route" => route).record(started.elapsed().as_secs_f64());

        match result {
            Ok(body) => {
                debug!(host, key, bytes = body.len(), "response from host");
                Ok(body)
            }
            Err(source) => {
                counter!("proxy_downstream_errors_total", "route" => route).increment(1);
                warn!(host, key, error = %source, "forwarding failed");
                Err(ProxyError::DownstreamUnavailable {
                    host: host.to_string(),
                    source,
                })
            }
        }
    }
}
