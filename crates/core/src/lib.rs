//! Tickerline Core - quote and candle resolution.
//!
//! This crate decides where a quote or price series comes from: the
//! process-local cache, the durable store, or the upstream provider. It is
//! database-agnostic and defines the store traits that `storage-sqlite`
//! implements.

pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod freshness;
pub mod resolver;
pub mod store;
pub mod tasks;

pub use cache::{CacheEntry, CacheTier, MemoryCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{FeatureFlags, ProviderConfig, ResolverConfig};
pub use errors::{ConfigError, ResolverError, Result, StoreError, ValidationError};
pub use freshness::{FreshnessPolicy, FreshnessVerdict};
pub use resolver::{
    HistoricalSeries, HistoryQuery, IntradaySeries, QuoteOutcome, Resolution, Resolver,
    ResolverBuilder, StaleReason,
};
pub use store::{PriceHistoryStore, PriceRow, QuoteRow, QuoteStore};
pub use tasks::{BackgroundTasks, TokioBackgroundTasks};
