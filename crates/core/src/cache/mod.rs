//! Process-local cache tier.
//!
//! Entries carry their own TTL. They are checked on read and expired ones
//! are swept on write; there is no eviction thread. Nothing survives a process restart.

mod memory;

pub use memory::MemoryCache;

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A cached value with the time it was stored and its lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub cached_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, cached_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            cached_at,
            ttl,
        }
    }

    /// Valid while `now - cached_at <= min(ttl, max_age)`.
    pub fn is_valid(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let age_ms = (now - self.cached_at).num_milliseconds().max(0);
        let limit_ms = self.ttl.min(max_age).as_millis();
        u128::try_from(age_ms).map(|age| age <= limit_ms).unwrap_or(false)
    }
}

/// Key/value cache with get-if-valid semantics.
///
/// `get` takes the caller's freshness window: an entry is served only if it
/// is within both its own TTL and `max_age`.
pub trait CacheTier<V>: Send + Sync {
    fn get(&self, key: &str, max_age: Duration) -> Option<V>;

    fn set(&self, key: &str, value: V, ttl: Duration);

    fn clear(&self);
}
