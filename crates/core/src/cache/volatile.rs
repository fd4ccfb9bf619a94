//! Process-memory cache tier.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;

use super::entry::CacheEntry;

/// Key/value cache held in process memory.
///
/// Expiry is checked at read time; there is no background eviction. Writes
/// replace whole entries, so concurrent writers resolve last-write-wins.
#[derive(Debug, Default)]
pub struct VolatileCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl VolatileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` until `now + ttl`, replacing any previous entry.
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.lock().insert(key.to_string(), CacheEntry::new(value, ttl));
    }

    /// The value if present and unexpired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = Utc::now();
        self.lock()
            .get(key)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.value.clone())
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live_at(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let cache = VolatileCache::new();
        cache.set("k", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_set_overwrites() {
        let cache = VolatileCache::new();
        cache.set("k", json!(1), Duration::from_secs(60));
        cache.set("k", json!(2), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_absent_on_every_read() {
        let cache = VolatileCache::new();
        cache.set("k", json!("v"), Duration::ZERO);
        for _ in 0..3 {
            assert_eq!(cache.get("k"), None);
        }
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = VolatileCache::new();
        cache.set("k", json!("v"), Duration::from_millis(30));
        assert_eq!(cache.get("k"), Some(json!("v")));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_purge_expired() {
        let cache = VolatileCache::new();
        cache.set("old", json!(1), Duration::ZERO);
        cache.set("fresh", json!(2), Duration::from_secs(60));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.remove("fresh"));
        assert!(cache.is_empty());
    }
}
