//! Durable on-device trip list.
//!
//! The whole list lives as one JSON array under [`TRIPS_KEY`] and is rewritten
//! on every change. Read-modify-write cycles are serialized by an async lock
//! so concurrent adds cannot drop each other's records.

use std::sync::Arc;

use tokio::sync::Mutex;
use tripbuddy_core::model::new_user_id;
use tripbuddy_core::{Error, StoreDb, TripRecord};

/// Reserved key holding the local trip list.
pub const TRIPS_KEY: &str = "user_trips";

/// Reserved key holding the device user id.
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone)]
pub struct TripStore {
    db: StoreDb,
    write_lock: Arc<Mutex<()>>,
}

impl TripStore {
    pub fn new(db: StoreDb) -> Self {
        Self { db, write_lock: Arc::new(Mutex::new(())) }
    }

    /// The stored list, or an error if it cannot be read or decoded.
    pub async fn try_load(&self) -> Result<Vec<TripRecord>, Error> {
        match self.db.get_value(TRIPS_KEY).await? {
            Some(stored) => Ok(serde_json::from_value(stored.value)?),
            None => Ok(Vec::new()),
        }
    }

    /// The stored list; unreadable storage reads as empty.
    pub async fn load(&self) -> Vec<TripRecord> {
        self.try_load().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load local trips");
            Vec::new()
        })
    }

    /// Replace the whole list.
    pub async fn save(&self, records: &[TripRecord]) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        self.write(records).await
    }

    async fn write(&self, records: &[TripRecord]) -> Result<(), Error> {
        let value = serde_json::to_value(records)?;
        self.db.put_value(TRIPS_KEY, &value, None).await
    }

    pub async fn append(&self, record: TripRecord) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.try_load().await?;
        records.push(record);
        self.write(&records).await
    }

    /// Flip the listed records from pending to synced.
    ///
    /// Returns how many records changed state.
    pub async fn mark_synced(&self, ids: &[String]) -> Result<usize, Error> {
        if ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;
        let mut records = self.try_load().await?;
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| r.is_pending() && ids.contains(&r.id)) {
            record.mark_synced();
            changed += 1;
        }

        if changed > 0 {
            self.write(&records).await?;
        }
        Ok(changed)
    }

    /// Remove the record with `id`, returning it if it was present.
    pub async fn remove(&self, id: &str) -> Result<Option<TripRecord>, Error> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.try_load().await?;
        let Some(pos) = records.iter().position(|r| r.id == id) else {
            return Ok(None);
        };

        let removed = records.remove(pos);
        self.write(&records).await?;
        Ok(Some(removed))
    }

    /// Records not yet acknowledged by the server.
    pub async fn pending(&self) -> Vec<TripRecord> {
        self.load().await.into_iter().filter(TripRecord::is_pending).collect()
    }

    /// The device user id, created and persisted on first use.
    ///
    /// If storage is unavailable a fresh id is returned without being saved.
    pub async fn user_id(&self) -> String {
        let _guard = self.write_lock.lock().await;
        match self.db.get_value(USER_ID_KEY).await {
            Ok(Some(stored)) => {
                if let Some(id) = stored.value.as_str().filter(|id| !id.is_empty()) {
                    return id.to_string();
                }
                tracing::warn!("stored user id is malformed, replacing it");
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read user id, using an ephemeral one");
                return new_user_id();
            }
        }

        let id = new_user_id();
        if let Err(e) = self.db.put_value(USER_ID_KEY, &serde_json::Value::String(id.clone()), None).await {
            tracing::warn!(error = %e, "failed to persist user id");
        } else {
            tracing::info!(user_id = %id, "created device user id");
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> TripStore {
        TripStore::new(StoreDb::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_empty_store_loads_empty() {
        let store = store().await;
        assert!(store.load().await.is_empty());
        assert!(store.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_and_load() {
        let store = store().await;
        let a = TripRecord::new_local("u1", json!({"to": "goa"}));
        let b = TripRecord::new_local("u1", json!({"to": "bom"}));
        store.append(a.clone()).await.unwrap();
        store.append(b.clone()).await.unwrap();

        assert_eq!(store.load().await, vec![a, b]);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_every_record() {
        let store = store().await;
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(TripRecord::new_local("u1", json!(i))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.len(), 8);
    }

    #[tokio::test]
    async fn test_mark_synced_only_touches_pending() {
        let store = store().await;
        let a = TripRecord::new_local("u1", json!(1));
        let b = TripRecord::new_local("u1", json!(2));
        store.save(&[a.clone(), b.clone()]).await.unwrap();

        assert_eq!(store.mark_synced(&[a.id.clone()]).await.unwrap(), 1);
        assert_eq!(store.mark_synced(&[a.id.clone()]).await.unwrap(), 0);

        let pending = store.pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store().await;
        let a = TripRecord::new_local("u1", json!(1));
        store.append(a.clone()).await.unwrap();

        assert_eq!(store.remove(&a.id).await.unwrap(), Some(a));
        assert_eq!(store.remove("missing").await.unwrap(), None);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_list_reads_as_empty_but_blocks_writes() {
        let store = store().await;
        store.db.put_value(TRIPS_KEY, &json!({"not": "a list"}), None).await.unwrap();

        assert!(store.load().await.is_empty());
        assert!(store.try_load().await.is_err());
        assert!(store.append(TripRecord::new_local("u1", json!(1))).await.is_err());
    }

    #[tokio::test]
    async fn test_user_id_is_stable() {
        let store = store().await;
        let first = store.user_id().await;
        let second = store.user_id().await;

        assert!(first.starts_with("user_"));
        assert_eq!(first, second);
        assert_eq!(store.db.get_value(USER_ID_KEY).await.unwrap().unwrap().value, json!(first));
    }
}
