//! Unified error types for TripBuddy.
//!
//! Messages carry a stable upper-case code prefix so that logs and HTTP
//! bodies can be matched without parsing free text.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the client and server crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed caller input (search fields, trip identity).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Record absent, or owned by someone else.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored or transmitted JSON could not be encoded or decoded.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error should be reported back to the caller as a rejected request.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
