//! Backend client error types.

use std::sync::Arc;

use reqwest::StatusCode;
use tripbuddy_core::api::ErrorBody;

/// Errors from the TripBuddy backend client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// Server refused the request as invalid (HTTP 400). Never retried.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Record absent or owned by another user (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Local token bucket empty, or the server answered 429.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// Any other non-success HTTP status.
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Base URL or path could not be joined into a request URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// Whether the request should not be retried as-is.
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Rejected(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { BackendError::Timeout } else { BackendError::Network(Arc::new(err)) }
    }
}

/// Map a non-success response to an error, preferring the server's `{error}` message.
pub fn classify(status: StatusCode, body: &str) -> BackendError {
    let message = || {
        serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string())
    };

    match status {
        StatusCode::BAD_REQUEST => BackendError::Rejected(message()),
        StatusCode::NOT_FOUND => BackendError::NotFound(message()),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited,
        _ => BackendError::Http { status: status.as_u16() },
    }
}
