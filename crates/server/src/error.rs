//! HTTP error mapping for the TripBuddy server.
//!
//! Every failure is returned as `{"error": "..."}`. Internal failures are
//! logged and redacted before they reach the client.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tripbuddy_core::api::ErrorBody;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("{0}")]
    Internal(String),
}

impl From<tripbuddy_core::Error> for ApiError {
    fn from(err: tripbuddy_core::Error) -> Self {
        match err {
            tripbuddy_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            tripbuddy_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error })
    }
}
