use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical quote shape.
///
/// Providers spell the same fields differently across API versions
/// (`changePercentage`, `changesPercentage`, `changePercent`, ...); every
/// variant is normalized into this struct before it leaves the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderQuote {
    pub symbol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Last traded price (required)
    pub price: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Day change in percent (e.g. 1.25 for +1.25%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percentage: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_low: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_high: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    /// Unix seconds
    pub timestamp: i64,
}

impl ProviderQuote {
    /// Create a quote with only the required fields.
    pub fn new(symbol: impl Into<String>, price: Decimal, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            price,
            change: None,
            change_percentage: None,
            day_low: None,
            day_high: None,
            open: None,
            previous_close: None,
            volume: None,
            market_cap: None,
            exchange: None,
            timestamp,
        }
    }
}
