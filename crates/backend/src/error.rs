//! Backend error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Request without a `key` query parameter.
    #[error("missing query parameter: key")]
    MissingKey,

    /// The control endpoint rejected a register/unregister call.
    #[error("{action} {host} rejected with {status}: {body}")]
    Registration {
        action: &'static str,
        host: String,
        status: u16,
        body: String,
    },

    #[error("invalid control endpoint uri: {0}")]
    InvalidUri(String),

    #[error("control endpoint unreachable: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("reading control endpoint response: {0}")]
    Body(#[from] hyper::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = match self {
            BackendError::MissingKey => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
