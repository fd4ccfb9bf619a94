//! Server-side result cache, partitioned by transport mode.
//!
//! Each partition has its own TTL and its own expiry clock, so flight results
//! can age out while train results for the same route are still served.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;

use super::key::CacheKey;
use crate::config::CacheTtlConfig;
use crate::model::TransportMode;

#[derive(Debug, Clone)]
struct Slot {
    results: Vec<Value>,
    inserted_at: Instant,
}

#[derive(Debug)]
struct Partition {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, Slot>>,
}

impl Partition {
    fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    fn is_live(&self, slot: &Slot, now: Instant) -> bool {
        now.duration_since(slot.inserted_at) < self.ttl
    }
}

/// Result cache shielding the upstream fare APIs.
///
/// Owned by the server process and shared across requests. Concurrent `set`
/// calls for one key resolve last-write-wins.
#[derive(Debug)]
pub struct RemoteCategoryCache {
    flights: Partition,
    trains: Partition,
    buses: Partition,
    cars: Partition,
}

impl RemoteCategoryCache {
    pub fn new(ttls: &CacheTtlConfig) -> Self {
        Self {
            flights: Partition::new(ttls.ttl_for(TransportMode::Flights)),
            trains: Partition::new(ttls.ttl_for(TransportMode::Trains)),
            buses: Partition::new(ttls.ttl_for(TransportMode::Buses)),
            cars: Partition::new(ttls.ttl_for(TransportMode::Cars)),
        }
    }

    fn partition(&self, mode: TransportMode) -> &Partition {
        match mode {
            TransportMode::Flights => &self.flights,
            TransportMode::Trains => &self.trains,
            TransportMode::Buses => &self.buses,
            TransportMode::Cars => &self.cars,
        }
    }

    /// TTL configured for a mode's partition.
    pub fn ttl(&self, mode: TransportMode) -> Duration {
        self.partition(mode).ttl
    }

    /// Cached results for `key`, if inserted less than one TTL ago.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<Value>> {
        let partition = self.partition(key.mode);
        let now = Instant::now();
        let entries = partition.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|slot| partition.is_live(slot, now))
            .map(|slot| slot.results.clone())
    }

    /// Cache `results` under `key`.
    ///
    /// Empty result sets are never stored and never overwrite an existing
    /// entry. Returns whether the entry was written.
    pub fn set(&self, key: CacheKey, results: Vec<Value>) -> bool {
        if results.is_empty() {
            tracing::debug!(key = %key, "not caching empty result set");
            return false;
        }

        tracing::debug!(key = %key, count = results.len(), "caching search results");
        let partition = self.partition(key.mode);
        let mut entries = partition.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, Slot { results, inserted_at: Instant::now() });
        true
    }

    /// Remove entries in `mode`'s partition matching the optional source and
    /// destination filters; with neither given the whole partition is flushed.
    ///
    /// Returns the number of removed entries.
    pub fn clear(&self, mode: TransportMode, source: Option<&str>, destination: Option<&str>) -> usize {
        let partition = self.partition(mode);
        let mut entries = partition.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, _| !key.matches(source, destination));
        let removed = before - entries.len();

        tracing::info!(mode = %mode, ?source, ?destination, removed, "cleared category cache");
        removed
    }

    /// Drop expired entries from every partition.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        TransportMode::ALL
            .iter()
            .map(|mode| {
                let partition = self.partition(*mode);
                let mut entries = partition.entries.write().unwrap_or_else(PoisonError::into_inner);
                let before = entries.len();
                entries.retain(|_, slot| partition.is_live(slot, now));
                before - entries.len()
            })
            .sum()
    }

    /// Number of stored entries in a partition, expired ones included.
    pub fn len(&self, mode: TransportMode) -> usize {
        self.partition(mode)
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for RemoteCategoryCache {
    fn default() -> Self {
        Self::new(&CacheTtlConfig::default())
    }
}
