//! Plain HTTP/1 forwarder.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Uri;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::error::ForwardError;
use crate::forward::Forwarder;

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwards `GET http://{host}/?key={key}` over a pooled hyper client.
#[derive(Clone, Debug)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl HttpForwarder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn uri(host: &str, key: &str) -> Result<Uri, ForwardError> {
        let invalid = |reason: String| ForwardError::InvalidUri {
            host: host.to_string(),
            reason,
        };
        let query = serde_urlencoded::to_string([("key", key)]).map_err(|e| invalid(e.to_string()))?;
        format!("http://{host}/?{query}")
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| invalid(e.to_string()))
    }

    async fn fetch(&self, uri: Uri) -> Result<String, ForwardError> {
        let response = self.client.get(uri).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = String::from_utf8_lossy(&bytes).into_owned();
        if !status.is_success() {
            return Err(ForwardError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl Default for HttpForwarder {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, host: &str, key: &str) -> Result<String, ForwardError> {
        let uri = Self::uri(host, key)?;
        tokio::time::timeout(self.timeout, self.fetch(uri))
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))?
    }

    fn name(&self) -> &'static str {
        "HttpForwarder"
    }
}
