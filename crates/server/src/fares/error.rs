//! Flight fare API client error types.

use std::sync::Arc;

/// Errors from the flight fare API client.
#[derive(Debug, thiserror::Error)]
pub enum FareError {
    /// Missing RapidAPI key.
    #[error("missing API key: TRIPBUDDY_RAPIDAPI_KEY not set")]
    MissingApiKey,

    /// Key rejected by the API (401/403).
    #[error("authentication failed: API access forbidden")]
    AuthError,

    /// Rate limited by the API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Response parsed but held no recognizable flight list.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl From<reqwest::Error> for FareError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FareError::Timeout } else { FareError::Network(Arc::new(err)) }
    }
}
