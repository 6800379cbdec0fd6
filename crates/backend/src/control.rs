//! Client for the proxy's control endpoint.

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Uri;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::info;

use crate::error::BackendError;

/// Registers and unregisters a host with the proxy.
#[derive(Clone, Debug)]
pub struct ControlClient {
    base: String,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl ControlClient {
    /// `base` is the proxy's address, with or without the `http://` scheme.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        let base = if base.starts_with("http://") {
            base
        } else {
            format!("http://{base}")
        };
        Self {
            base: base.trim_end_matches('/').to_string(),
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub async fn register(&self, host: &str) -> Result<String, BackendError> {
        self.call("register", host).await
    }

    pub async fn unregister(&self, host: &str) -> Result<String, BackendError> {
        self.call("unregister", host).await
    }

    async fn call(&self, action: &'static str, host: &str) -> Result<String, BackendError> {
        let query = serde_urlencoded::to_string([("host", host)])
            .map_err(|e| BackendError::InvalidUri(e.to_string()))?;
        let uri: Uri = format!("{}/{action}?{query}", self.base)
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| BackendError::InvalidUri(e.to_string()))?;

        let response = self.client.get(uri).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = String::from_utf8_lossy(&bytes).into_owned();
        if !status.is_success() {
            return Err(BackendError::Registration {
                action,
                host: host.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        info!(host, proxy = %self.base, "{body}");
        Ok(body)
    }
}
