//! Backend HTTP server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cache::ExpiringCache;
use crate::control::ControlClient;
use crate::error::BackendError;

/// Settings for one backend host.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Address this host registers under (`name:port`), as reachable from
    /// the proxy.
    pub advertise: String,
    /// Proxy control endpoint. `None` runs the host unregistered.
    pub proxy: Option<String>,
    /// How long a cached answer lives.
    pub ttl: Duration,
}

impl BackendConfig {
    pub fn new(advertise: impl Into<String>) -> Self {
        Self {
            advertise: advertise.into(),
            proxy: None,
            ttl: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeyParams {
    key: Option<String>,
}

async fn lookup(
    State(cache): State<Arc<ExpiringCache>>,
    Query(params): Query<KeyParams>,
) -> Result<String, BackendError> {
    let key = params
        .key
        .filter(|k| !k.is_empty())
        .ok_or(BackendError::MissingKey)?;
    let (val, hit) = cache.get_or_insert_with(&key, || format!("hello: {key}"));
    if !hit {
        info!(key = %key, val = %val, "cached key");
    }
    Ok(val)
}

/// Example backend host answering `GET /?key=K`.
pub struct BackendServer {
    config: BackendConfig,
    cache: Arc<ExpiringCache>,
}

impl BackendServer {
    pub fn new(config: BackendConfig) -> Self {
        let cache = Arc::new(ExpiringCache::new(config.ttl));
        Self { config, cache }
    }

    pub fn cache(&self) -> &Arc<ExpiringCache> {
        &self.cache
    }

    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .route("/", get(lookup))
            .with_state(Arc::clone(&self.cache))
    }

    /// Register with the proxy, serve until `shutdown` resolves, then
    /// unregister.
    ///
    /// A failed registration aborts startup; a failed unregistration is only
    /// logged.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), BackendError> {
        info!(addr = %listener.local_addr()?, advertise = %self.config.advertise, "start server");

        let control = self.config.proxy.as_deref().map(ControlClient::new);
        if let Some(control) = &control {
            control.register(&self.config.advertise).await?;
        }

        let every = self.config.ttl.clamp(Duration::from_millis(10), Duration::from_secs(1));
        let sweeper = self.cache.spawn_sweeper(every);
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await;
        sweeper.abort();

        if let Some(control) = &control {
            if let Err(e) = control.unregister(&self.config.advertise).await {
                warn!(error = %e, "failed to unregister from proxy");
            }
        }
        served.map_err(BackendError::from)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn get(app: &axum::Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_answers_and_caches() {
        let server = BackendServer::new(BackendConfig::new("127.0.0.1:0"));
        let app = server.router();

        assert_eq!(get(&app, "/?key=k1").await, (StatusCode::OK, "hello: k1".to_string()));
        assert_eq!(server.cache().len(), 1);
        assert_eq!(get(&app, "/?key=k1").await.1, "hello: k1");
        assert_eq!(server.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let server = BackendServer::new(BackendConfig::new("127.0.0.1:0"));
        let (status, body) = get(&server.router(), "/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "missing query parameter: key");
    }

    #[tokio::test]
    async fn test_registration_failure_aborts_startup() {
        // Nothing listens on the proxy port.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let mut config = BackendConfig::new("127.0.0.1:1");
        config.proxy = Some(format!("127.0.0.1:{port}"));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = BackendServer::new(config)
            .serve(listener, std::future::pending())
            .await;
        assert!(matches!(result, Err(BackendError::Transport(_))));
    }
}
