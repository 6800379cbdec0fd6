//! HTTP control endpoint.
//!
//! - `GET|POST /register?host=H`: register a backend host
//! - `GET|POST /unregister?host=H`: unregister a backend host
//! - `GET /host?key=K`: forward to the key's owner
//! - `GET /hostCapacious?key=K`: forward to the owner, subject to the load bound
//! - `GET /hosts`: registered hosts (JSON)
//! - `GET /loads`: per-host load, total, and current ceiling (JSON)
//!
//! Success bodies are plain text; failures carry the error text with a
//! non-2xx status.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::ProxyError;
use crate::forward::{Forwarder, HttpForwarder};
use crate::router::Router;

#[derive(Debug, Deserialize)]
struct HostParams {
    host: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyParams {
    key: Option<String>,
}

/// Body of `GET /loads`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadsResponse {
    pub loads: BTreeMap<String, i64>,
    pub total: i64,
    pub max: i64,
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ProxyError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ProxyError::MissingParam(name))
}

async fn register<F: Forwarder>(
    State(router): State<Arc<Router<F>>>,
    Query(params): Query<HostParams>,
) -> Result<String, ProxyError> {
    let host = required(params.host, "host")?;
    router.register_host(&host)?;
    Ok(format!("register host: {host} success"))
}

async fn unregister<F: Forwarder>(
    State(router): State<Arc<Router<F>>>,
    Query(params): Query<HostParams>,
) -> Result<String, ProxyError> {
    let host = required(params.host, "host")?;
    router.unregister_host(&host)?;
    Ok(format!("unregister host: {host} success"))
}

async fn host<F: Forwarder>(
    State(router): State<Arc<Router<F>>>,
    Query(params): Query<KeyParams>,
) -> Result<String, ProxyError> {
    let key = required(params.key, "key")?;
    let val = router.get_host(&key).await?;
    Ok(format!("key: {key}, val: {val}"))
}

async fn host_capacious<F: Forwarder>(
    State(router): State<Arc<Router<F>>>,
    Query(params): Query<KeyParams>,
) -> Result<String, ProxyError> {
    let key = required(params.key, "key")?;
    let val = router.get_host_capacious(&key).await?;
    Ok(format!("key: {key}, val: {val}"))
}

async fn hosts<F: Forwarder>(State(router): State<Arc<Router<F>>>) -> Json<Vec<String>> {
    Json(router.ring().hosts())
}

async fn loads<F: Forwarder>(State(router): State<Arc<Router<F>>>) -> Json<LoadsResponse> {
    let ring = router.ring();
    let snapshot = ring.load_snapshot();
    Json(LoadsResponse {
        loads: snapshot.loads.into_iter().collect(),
        total: snapshot.total,
        max: ring.max_load(),
    })
}

/// Control endpoint server backed by a [`Router`].
pub struct ProxyServer<F = HttpForwarder> {
    router: Arc<Router<F>>,
}

impl<F: Forwarder> ProxyServer<F> {
    pub fn new(router: Arc<Router<F>>) -> Self {
        Self { router }
    }

    /// The axum router, for serving or for driving in tests.
    pub fn into_router(self) -> axum::Router {
        axum::Router::new()
            .route("/register", get(register::<F>).post(register::<F>))
            .route("/unregister", get(unregister::<F>).post(unregister::<F>))
            .route("/host", get(host::<F>))
            .route("/hostCapacious", get(host_capacious::<F>))
            .route("/hosts", get(hosts::<F>))
            .route("/loads", get(loads::<F>))
            .with_state(self.router)
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        info!(addr = %listener.local_addr()?, "start proxy server");
        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
