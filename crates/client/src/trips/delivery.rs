//! Best-effort remote delivery.
//!
//! Every remote trip call goes through [`settle`], which decides whether a
//! failure is the caller's problem (the server rejected the input) or is
//! absorbed and retried later.

use tripbuddy_core::Error;

use crate::backend::BackendError;

/// What happened to a best-effort remote call.
#[derive(Debug)]
pub enum Delivery<T> {
    Delivered(T),
    /// Not delivered this time; safe to retry.
    Deferred(BackendError),
}

impl<T> Delivery<T> {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }

    pub fn delivered(self) -> Option<T> {
        match self {
            Delivery::Delivered(value) => Some(value),
            Delivery::Deferred(_) => None,
        }
    }
}

/// Classify the result of remote operation `op`.
///
/// A rejection becomes `Err(InvalidInput)`; any other failure is logged and
/// deferred.
pub fn settle<T>(op: &str, result: Result<T, BackendError>) -> Result<Delivery<T>, Error> {
    match result {
        Ok(value) => Ok(Delivery::Delivered(value)),
        Err(BackendError::Rejected(msg)) => {
            tracing::warn!(op, reason = %msg, "remote rejected request");
            Err(Error::InvalidInput(msg))
        }
        Err(e) => {
            tracing::warn!(op, error = %e, "remote call deferred");
            Ok(Delivery::Deferred(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_is_delivered() {
        let delivery = settle("push", Ok::<_, BackendError>(3)).unwrap();
        assert!(delivery.is_delivered());
        assert_eq!(delivery.delivered(), Some(3));
    }

    #[test]
    fn test_transient_failures_are_deferred() {
        for err in [BackendError::Timeout, BackendError::RateLimited, BackendError::Http { status: 502 }] {
            let delivery = settle::<()>("push", Err(err)).unwrap();
            assert!(matches!(delivery, Delivery::Deferred(_)));
        }
    }

    #[test]
    fn test_rejection_surfaces_as_validation_error() {
        let err = settle::<()>("push", Err(BackendError::Rejected("userId is required".into()))).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("userId is required"));
    }
}
