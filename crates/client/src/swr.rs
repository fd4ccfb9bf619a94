//! Stale-while-revalidate read path.
//!
//! Resolution order for a keyed read is volatile, then durable, then the
//! network. A hit in either cache tier is returned immediately, marked stale,
//! while a detached task refetches and rewrites both tiers.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tripbuddy_core::{AppConfig, VolatileCache};

use crate::durable::DurableCache;

/// Outcome of [`SwrCoordinator::resolve`].
#[derive(Debug)]
pub struct Resolved<T> {
    /// `None` only when nothing was cached and the fetch failed.
    pub data: Option<T>,
    /// True when `data` came from a cache tier.
    pub stale: bool,
    /// Handle of the background refresh started by a cache hit.
    pub refresh: Option<JoinHandle<()>>,
}

impl<T> Resolved<T> {
    fn fresh(data: Option<T>) -> Self {
        Self { data, stale: false, refresh: None }
    }
}

/// Read-through coordinator over the two local cache tiers.
#[derive(Debug, Clone)]
pub struct SwrCoordinator {
    volatile: Arc<VolatileCache>,
    durable: DurableCache,
    volatile_ttl: Duration,
    durable_ttl: Duration,
}

impl SwrCoordinator {
    pub fn new(volatile: Arc<VolatileCache>, durable: DurableCache, volatile_ttl: Duration, durable_ttl: Duration) -> Self {
        Self { volatile, durable, volatile_ttl, durable_ttl }
    }

    pub fn from_config(volatile: Arc<VolatileCache>, durable: DurableCache, config: &AppConfig) -> Self {
        Self::new(volatile, durable, config.volatile_ttl(), config.durable_ttl())
    }

    /// Resolve `key`, falling back to `fetch`.
    ///
    /// Without a key the fetch runs once and no cache is read or written.
    /// A failed fetch yields `data: None` and leaves both tiers untouched.
    pub async fn resolve<T, E, F, Fut>(&self, key: Option<&str>, fetch: F) -> Resolved<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let Some(key) = key else {
            return Resolved::fresh(fetch().await.inspect_err(|e| tracing::warn!(error = %e, "uncached fetch failed")).ok());
        };

        if let Some(data) = self.volatile.get(key).and_then(|v| decode::<T>(key, v)) {
            tracing::debug!(key, tier = "volatile", "cache hit");
            let refresh = self.spawn_refresh(key, fetch());
            return Resolved { data: Some(data), stale: true, refresh: Some(refresh) };
        }

        if let Some(data) = self.durable.get(key).await.and_then(|v| decode::<T>(key, v)) {
            tracing::debug!(key, tier = "durable", "cache hit");
            let refresh = self.spawn_refresh(key, fetch());
            return Resolved { data: Some(data), stale: true, refresh: Some(refresh) };
        }

        tracing::debug!(key, "cache miss");
        match fetch().await {
            Ok(data) => {
                if let Some(value) = cacheable(key, &data) {
                    write_tiers(&self.volatile, &self.durable, key, value, self.volatile_ttl, self.durable_ttl).await;
                }
                Resolved::fresh(Some(data))
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "fetch failed on cache miss");
                Resolved::fresh(None)
            }
        }
    }

    /// Drop `key` from both tiers.
    pub async fn invalidate(&self, key: &str) {
        self.volatile.remove(key);
        self.durable.delete(key).await;
    }

    /// Run `fut` detached and rewrite both tiers on success.
    ///
    /// The returned handle resolves once the refresh has finished or failed;
    /// a panic inside the refresh is logged rather than propagated.
    fn spawn_refresh<T, E, Fut>(&self, key: &str, fut: Fut) -> JoinHandle<()>
    where
        T: Serialize + Send + 'static,
        E: Display + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (volatile, durable) = (Arc::clone(&self.volatile), self.durable.clone());
        let (volatile_ttl, durable_ttl) = (self.volatile_ttl, self.durable_ttl);
        let key = key.to_string();

        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let value = match fut.await {
                Ok(data) => cacheable(&task_key, &data),
                Err(e) => {
                    tracing::warn!(key = %task_key, error = %e, "background refresh failed");
                    return;
                }
            };
            if let Some(value) = value {
                write_tiers(&volatile, &durable, &task_key, value, volatile_ttl, durable_ttl).await;
                tracing::debug!(key = %task_key, "background refresh stored");
            }
        });

        tokio::spawn(async move {
            if let Err(e) = task.await {
                tracing::error!(key = %key, error = %e, "background refresh task aborted");
            }
        })
    }
}

/// JSON form of `data`, or `None` for null and unserializable values.
fn cacheable<T: Serialize>(key: &str, data: &T) -> Option<Value> {
    match serde_json::to_value(data) {
        Ok(Value::Null) => {
            tracing::debug!(key, "not caching null value");
            None
        }
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "value not cacheable");
            None
        }
    }
}

async fn write_tiers(
    volatile: &VolatileCache, durable: &DurableCache, key: &str, value: Value, volatile_ttl: Duration,
    durable_ttl: Duration,
) {
    durable.set(key, &value, durable_ttl).await;
    volatile.set(key, value, volatile_ttl);
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Option<T> {
    serde_json::from_value(value)
        .inspect_err(|e| tracing::warn!(key, error = %e, "cached value has unexpected shape"))
        .ok()
}
