use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use log::debug;

use super::{CacheEntry, CacheTier};
use crate::clock::{Clock, SystemClock};

/// In-memory [`CacheTier`] over a concurrent map. Last write wins.
pub struct MemoryCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of entries held, including stale ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheTier<V> for MemoryCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str, max_age: Duration) -> Option<V> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_valid(now, max_age) {
                return Some(entry.value.clone());
            }
        }

        // The read guard above is released; drop the entry if it has outlived
        // its own TTL. Entries only too old for this caller's window stay.
        if self
            .entries
            .remove_if(key, |_, entry| !entry.is_valid(now, entry.ttl))
            .is_some()
        {
            debug!("Evicted expired cache entry {}", key);
        }
        None
    }

    /// Entries past their own TTL are swept on every write, so keys that are
    /// never read again do not accumulate.
    fn set(&self, key: &str, value: V, ttl: Duration) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| entry.is_valid(now, entry.ttl));
        self.entries.insert(key.to_string(), CacheEntry::new(value, now, ttl));
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
