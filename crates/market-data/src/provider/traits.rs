//! Market data provider trait definitions.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::MarketDataError;
use crate::models::{AssetProfile, BarResolution, ProviderQuote, RawBar};

/// Trait for upstream market data providers.
///
/// Implementations own endpoint selection, retries and payload
/// normalization; callers only ever see canonical models or a classified
/// [`MarketDataError`].
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tickerline_market_data::{MarketDataProvider, MarketDataError, ProviderQuote};
///
/// struct StaticProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for StaticProvider {
///     fn id(&self) -> &'static str {
///         "STATIC"
///     }
///
///     async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
///         Ok(ProviderQuote::new(symbol, rust_decimal::Decimal::ONE, 0))
///     }
///
///     // ... fetch_bars
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier used in logs and error messages.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for a symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError>;

    /// Fetch bars at `resolution` for the inclusive date range `[from, to]`.
    ///
    /// Bars are returned ascending by timestamp. An empty vector is a valid
    /// answer when the provider has nothing for the range.
    async fn fetch_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        resolution: BarResolution,
    ) -> Result<Vec<RawBar>, MarketDataError>;

    /// Fetch the asset profile for a symbol.
    ///
    /// Default implementation reports no data.
    async fn fetch_profile(&self, symbol: &str) -> Result<AssetProfile, MarketDataError> {
        Err(MarketDataError::NoData(format!("{}: no profile from {}", symbol, self.id())))
    }
}
