//! Tickerline Market Data Crate
//!
//! Everything that talks to, or reshapes data from, the upstream market data
//! provider lives here:
//! - Canonical models: [`RawBar`], [`Candle`], [`ProviderQuote`], [`AssetProfile`]
//! - The [`MarketDataProvider`] trait and the FMP-style [`FmpProvider`]
//! - Retry with exponential backoff ([`RetryPolicy`]) and the ordered
//!   endpoint fallthrough ([`first_valid`])
//! - The OHLCV aggregation engine ([`aggregation`])
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |  Endpoint list   | --> |   first_valid    | --> |   RetryPolicy    |
//! +------------------+     +------------------+     +------------------+
//!                                  |                         |
//!                                  v                         v
//!                          +------------------+     +------------------+
//!                          |    normalize     | <-- |  HTTP (reqwest)  |
//!                          +------------------+     +------------------+
//!                                  |
//!                                  v
//!                    ProviderQuote / RawBar / AssetProfile
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   aggregation    |  (RawBar -> Candle)
//!                          +------------------+
//! ```

pub mod aggregation;
pub mod errors;
pub mod models;
pub mod provider;

pub use aggregation::{aggregate, aggregate_bars, rollup_daily, Bucketing, IntervalSpec, MissingPrice};
pub use errors::{FailureKind, MarketDataError, RetryClass};
pub use models::{AssetProfile, BarResolution, Candle, ProviderQuote, RawBar};
pub use provider::encyclopedia::{DescriptionSource, WikipediaSummaryClient};
pub use provider::fmp::FmpProvider;
pub use provider::{first_valid, Endpoint, MarketDataProvider, ProviderSettings, RetryPolicy};
