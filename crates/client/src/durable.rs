//! On-device cache tier backed by the `kv_store` table.
//!
//! Every storage failure is logged and treated as a miss or a no-op; nothing
//! here returns an error to the caller.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tripbuddy_core::{Error, StoreDb};
use tripbuddy_core::cache::entry::expiry_from;

/// Prefix separating cache entries from the reserved trip keys in the same table.
const NAMESPACE: &str = "cache:";

/// Persistent key/value cache with per-entry expiry.
#[derive(Debug, Clone)]
pub struct DurableCache {
    db: StoreDb,
}

impl DurableCache {
    pub fn new(db: StoreDb) -> Self {
        Self { db }
    }

    fn storage_key(key: &str) -> String {
        format!("{NAMESPACE}{key}")
    }

    /// The value if present and unexpired.
    ///
    /// An expired entry is deleted before reporting absent.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let storage_key = Self::storage_key(key);
        let stored = match self.db.get_value(&storage_key).await {
            Ok(stored) => stored?,
            Err(e @ Error::Serialization(_)) => {
                tracing::warn!(key, error = %e, "dropping undecodable durable cache entry");
                self.evict(key, &storage_key).await;
                return None;
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "durable cache read failed");
                return None;
            }
        };

        if stored.is_expired_at(Utc::now()) {
            tracing::debug!(key, "durable cache entry expired");
            self.evict(key, &storage_key).await;
            return None;
        }

        Some(stored.value)
    }

    async fn evict(&self, key: &str, storage_key: &str) {
        if let Err(e) = self.db.delete_value(storage_key).await {
            tracing::warn!(key, error = %e, "failed to delete durable cache entry");
        }
    }

    /// Number of stored entries, expired ones included. 0 on failure.
    pub async fn len(&self) -> u64 {
        self.db
            .count_values(NAMESPACE)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "durable cache count failed"))
            .unwrap_or_default()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Store `value` until `now + ttl`.
    pub async fn set(&self, key: &str, value: &Value, ttl: Duration) {
        let expires_at = expiry_from(Utc::now(), ttl);
        if let Err(e) = self.db.put_value(&Self::storage_key(key), value, Some(expires_at)).await {
            tracing::warn!(key, error = %e, "durable cache write failed");
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.db.delete_value(&Self::storage_key(key)).await {
            tracing::warn!(key, error = %e, "durable cache delete failed");
        }
    }

    /// Remove every expired entry. Returns how many were removed, 0 on failure.
    pub async fn purge_expired(&self) -> u64 {
        match self.db.purge_expired_values().await {
            Ok(n) => {
                tracing::debug!(removed = n, "purged expired durable cache entries");
                n
            }
            Err(e) => {
                tracing::warn!(error = %e, "durable cache purge failed");
                0
            }
        }
    }
}
