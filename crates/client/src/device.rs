//! Device-side wiring of caches, storage and the backend client.

use std::sync::Arc;

use tripbuddy_core::{AppConfig, CacheKey, SearchRequest, SearchResponse, StoreDb, VolatileCache};

use crate::backend::{BackendClient, BackendError};
use crate::durable::DurableCache;
use crate::swr::{Resolved, SwrCoordinator};
use crate::trips::{SyncReconciler, TripStore};

/// Errors raised while assembling a [`Device`].
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error(transparent)]
    Store(#[from] tripbuddy_core::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Everything the app needs on one device, built from one [`AppConfig`].
pub struct Device {
    pub swr: SwrCoordinator,
    pub trips: SyncReconciler,
    backend: BackendClient,
}

impl Device {
    /// Open the device store at `config.db_path` and connect the backend client.
    pub async fn open(config: &AppConfig) -> Result<Self, DeviceError> {
        let db = StoreDb::open(&config.db_path).await?;
        Self::with_store(db, config)
    }

    pub fn with_store(db: StoreDb, config: &AppConfig) -> Result<Self, DeviceError> {
        let backend = BackendClient::new(config)?;
        let swr = SwrCoordinator::from_config(Arc::new(VolatileCache::new()), DurableCache::new(db.clone()), config);
        let trips = SyncReconciler::new(TripStore::new(db), Arc::new(backend.clone()));

        tracing::info!(backend = %config.backend_url, "device ready");
        Ok(Self { swr, trips, backend })
    }

    /// Search through the SWR path, keyed on the normalized search fingerprint.
    pub async fn search(&self, req: SearchRequest) -> Resolved<SearchResponse> {
        let key = CacheKey::from(&req).to_string();
        let backend = self.backend.clone();
        self.swr
            .resolve(Some(&key), move || async move { backend.search(&req).await })
            .await
    }
}
