//! Remote trip store seam.

use async_trait::async_trait;
use tripbuddy_core::TripRecord;

use crate::backend::BackendError;

/// Result of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Created,
    /// The server already held a record with the same `(userId, id)`.
    AlreadyExists,
}

/// The authoritative trip store as seen from the device.
///
/// `push` must be idempotent on `(user_id, id)`.
#[async_trait]
pub trait RemoteTrips: Send + Sync {
    async fn push(&self, record: &TripRecord) -> Result<PushOutcome, BackendError>;

    async fn fetch(&self, user_id: &str) -> Result<Vec<TripRecord>, BackendError>;

    async fn delete(&self, user_id: &str, trip_id: &str) -> Result<(), BackendError>;
}
