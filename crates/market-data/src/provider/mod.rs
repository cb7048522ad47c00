//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The [`MarketDataProvider`] trait
//! - [`RetryPolicy`] (bounded exponential backoff on rate limits/timeouts)
//! - The ordered endpoint combinator [`first_valid`]
//! - Payload normalization helpers
//! - The FMP-style HTTP provider and the encyclopedia description source

mod endpoint;
mod retry;
mod traits;

pub mod encyclopedia;
pub mod fmp;
pub mod normalize;

use std::time::Duration;

pub use endpoint::{error_envelope, first_valid, Endpoint};
pub use retry::RetryPolicy;
pub use traits::MarketDataProvider;

pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com";

/// Connection settings for an HTTP provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ProviderSettings {
    /// Settings with the default base URL, a 30 s timeout and the default
    /// retry policy.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
