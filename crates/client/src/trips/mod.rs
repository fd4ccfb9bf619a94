//! Offline-first trip writes and their reconciliation with the server.
//!
//! Writes land in the local [`TripStore`] first and are pushed to the server
//! opportunistically. Records the server has not acknowledged stay `pending`
//! until [`SyncReconciler::sync_pending`] delivers them.

pub mod delivery;
pub mod remote;
pub mod store;

pub use delivery::{Delivery, settle};
pub use remote::{PushOutcome, RemoteTrips};
pub use store::TripStore;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tripbuddy_core::model::validate_identifier;
use tripbuddy_core::{Error, TripRecord};

/// Tally of one [`SyncReconciler::sync_pending`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub deferred: usize,
    /// Refused by the server as invalid; dropped locally and never retried.
    pub rejected: usize,
}

/// Coordinates the local trip list with the remote store.
#[derive(Clone)]
pub struct SyncReconciler {
    store: TripStore,
    remote: Arc<dyn RemoteTrips>,
}

impl SyncReconciler {
    pub fn new(store: TripStore, remote: Arc<dyn RemoteTrips>) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &TripStore {
        &self.store
    }

    /// Save a trip locally, then try to push it.
    ///
    /// The returned record reflects the final local state: `synced` if the
    /// push went through, `pending` otherwise. Only local storage failures
    /// and server rejections are returned as errors; a rejected record is
    /// removed from the local store again.
    pub async fn add_trip(&self, user_id: &str, payload: Value) -> Result<TripRecord, Error> {
        validate_identifier("userId", user_id)?;

        let mut record = TripRecord::new_local(user_id, payload);
        self.store.append(record.clone()).await?;
        tracing::info!(trip_id = %record.id, user_id, "trip saved locally");

        let delivery = match settle("push", self.remote.push(&record).await) {
            Ok(delivery) => delivery,
            Err(e) => {
                self.discard(&record.id).await;
                return Err(e);
            }
        };
        if let Delivery::Delivered(outcome) = delivery {
            tracing::debug!(trip_id = %record.id, ?outcome, "trip pushed");
            match self.store.mark_synced(std::slice::from_ref(&record.id)).await {
                Ok(_) => record.mark_synced(),
                Err(e) => tracing::warn!(trip_id = %record.id, error = %e, "failed to record sync state"),
            }
        }

        Ok(record)
    }

    /// The merged view of local and remote trips for `user_id`, newest first.
    ///
    /// Local and remote reads run concurrently. On an id collision the local
    /// copy wins. If the remote read fails only local records are returned.
    pub async fn list_trips(&self, user_id: &str) -> Vec<TripRecord> {
        let (local, remote) = tokio::join!(self.store.load(), self.remote.fetch(user_id));
        let mut local: Vec<TripRecord> = local.into_iter().filter(|r| r.user_id == user_id).collect();

        let remote = match settle("fetch", remote) {
            Ok(Delivery::Delivered(records)) => records,
            Ok(Delivery::Deferred(_)) => Vec::new(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "remote trip list refused");
                Vec::new()
            }
        };

        let remote_ids: HashSet<&str> = remote.iter().map(|r| r.id.as_str()).collect();
        let confirmed: Vec<String> = local
            .iter()
            .filter(|r| r.is_pending() && remote_ids.contains(r.id.as_str()))
            .map(|r| r.id.clone())
            .collect();
        if !confirmed.is_empty() {
            match self.store.mark_synced(&confirmed).await {
                Ok(n) => {
                    tracing::debug!(promoted = n, "pending trips confirmed by server");
                    local
                        .iter_mut()
                        .filter(|r| confirmed.contains(&r.id))
                        .for_each(TripRecord::mark_synced);
                }
                Err(e) => tracing::warn!(error = %e, "failed to promote confirmed trips"),
            }
        }

        merge(local, remote)
    }

    /// Remove a trip locally, then try to delete it remotely.
    ///
    /// Returns whether a local record was removed. A remote failure is logged
    /// and does not undo the local removal.
    pub async fn remove_trip(&self, trip_id: &str) -> Result<bool, Error> {
        let removed = self.store.remove(trip_id).await?;
        let owner = match &removed {
            Some(record) => record.user_id.clone(),
            None => self.store.user_id().await,
        };

        match settle("delete", self.remote.delete(&owner, trip_id).await) {
            Ok(Delivery::Delivered(())) => tracing::debug!(trip_id, "remote trip deleted"),
            Ok(Delivery::Deferred(_)) => {}
            Err(e) => tracing::warn!(trip_id, error = %e, "remote delete refused"),
        }

        Ok(removed.is_some())
    }

    /// Push every pending record once.
    pub async fn sync_pending(&self) -> SyncReport {
        let pending = self.store.pending().await;
        let mut report = SyncReport::default();
        let mut synced_ids = Vec::new();

        for record in &pending {
            match settle("push", self.remote.push(record).await) {
                Ok(Delivery::Delivered(_)) => synced_ids.push(record.id.clone()),
                Ok(Delivery::Deferred(_)) => report.deferred += 1,
                Err(_) => {
                    self.discard(&record.id).await;
                    report.rejected += 1;
                }
            }
        }

        match self.store.mark_synced(&synced_ids).await {
            Ok(n) => report.synced = n,
            Err(e) => {
                tracing::warn!(error = %e, "failed to record sync state");
                report.deferred += synced_ids.len();
            }
        }

        if !pending.is_empty() {
            tracing::info!(synced = report.synced, deferred = report.deferred, rejected = report.rejected, "sync pass finished");
        }
        report
    }

    /// Drop a record the server refused; it would be refused on every retry.
    async fn discard(&self, trip_id: &str) {
        match self.store.remove(trip_id).await {
            Ok(_) => tracing::warn!(trip_id, "dropped trip rejected by server"),
            Err(e) => tracing::warn!(trip_id, error = %e, "failed to drop rejected trip"),
        }
    }

    /// Run [`Self::sync_pending`] every `interval` until the handle is aborted.
    pub fn spawn_background_sync(&self, interval: Duration) -> JoinHandle<()> {
        let reconciler = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                reconciler.sync_pending().await;
            }
        })
    }
}

/// Local records first, then remote records with unseen ids, newest first.
fn merge(local: Vec<TripRecord>, remote: Vec<TripRecord>) -> Vec<TripRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<TripRecord> = local
        .into_iter()
        .chain(remote.into_iter().map(TripRecord::into_remote))
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    merged
}
