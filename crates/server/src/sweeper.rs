//! Periodic removal of expired category cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tripbuddy_core::RemoteCategoryCache;

/// Purge expired entries every `interval` until the task is aborted.
pub fn spawn(cache: Arc<RemoteCategoryCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "swept expired cache entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tripbuddy_core::config::CacheTtlConfig;
    use tripbuddy_core::{CacheKey, TransportMode};

    #[tokio::test]
    async fn test_sweeper_purges_expired_entries() {
        let ttls = CacheTtlConfig { trains: 0, ..Default::default() };
        let cache = Arc::new(RemoteCategoryCache::new(&ttls));
        cache.set(CacheKey::new(TransportMode::Trains, "delhi", "mumbai", None), vec![json!(1)]);
        cache.set(CacheKey::new(TransportMode::Buses, "pune", "goa", None), vec![json!(2)]);

        let handle = spawn(cache.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(cache.len(TransportMode::Trains), 0);
        assert_eq!(cache.len(TransportMode::Buses), 1);
    }
}
