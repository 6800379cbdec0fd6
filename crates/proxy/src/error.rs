//! Error types for the routing layer and their HTTP mapping.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure talking to a backend host.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Host name does not form a valid request URI.
    #[error("invalid uri for host {host}: {reason}")]
    InvalidUri { host: String, reason: String },

    /// Connection or protocol failure.
    #[error("request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    /// Failure while reading the response body.
    #[error("reading response body: {0}")]
    Body(#[from] hyper::Error),

    /// Backend answered with a non-2xx status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors surfaced by [`Router`](crate::Router) and the control endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Ring-level failure: duplicate host, unknown host, empty ring, or no
    /// host with spare capacity.
    #[error(transparent)]
    Ring(#[from] corelib::Error),

    /// The resolved host could not answer.
    #[error("host {host} unavailable: {source}")]
    DownstreamUnavailable {
        host: String,
        #[source]
        source: ForwardError,
    },

    /// A required query parameter was absent or empty.
    #[error("missing query parameter: {0}")]
    MissingParam(&'static str),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Ring(corelib::Error::HostAlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Ring(corelib::Error::HostNotFound(_) | corelib::Error::EmptyRing) => {
                StatusCode::NOT_FOUND
            }
            Self::Ring(corelib::Error::CapacityExhausted) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DownstreamUnavailable {
                source: ForwardError::Timeout(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            Self::DownstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::MissingParam(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
