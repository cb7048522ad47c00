//! Durable store traits and row shapes.
//!
//! These traits abstract the persistence layer; `tickerline-storage-sqlite`
//! implements them over Diesel. All writes are upserts by natural key.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tickerline_market_data::{ProviderQuote, RawBar};

use crate::errors::StoreError;

/// Persisted quote, keyed by `(symbol, timestamp)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub symbol: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_low: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_high: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
    /// Unix seconds
    pub timestamp: i64,
}

impl QuoteRow {
    /// Row for a freshly fetched quote, stamped with the fetch time.
    pub fn from_quote(quote: &ProviderQuote, fetched_at: DateTime<Utc>) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            price: quote.price,
            day_low: quote.day_low,
            day_high: quote.day_high,
            volume: quote.volume,
            timestamp: fetched_at.timestamp(),
        }
    }

    pub fn to_quote(&self) -> ProviderQuote {
        ProviderQuote {
            day_low: self.day_low,
            day_high: self.day_high,
            volume: self.volume,
            ..ProviderQuote::new(self.symbol.clone(), self.price, self.timestamp)
        }
    }
}

/// Persisted daily price, keyed by `(symbol, date)`.
///
/// `price` is the close. OHLC columns are null on legacy rows written before
/// OHLC capture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: Decimal,
    pub volume: Option<Decimal>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
}

impl PriceRow {
    pub fn has_complete_ohlc(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some()
    }

    /// Row for a daily bar. Bars without a close cannot be stored.
    pub fn from_bar(symbol: &str, bar: &RawBar) -> Option<Self> {
        Some(Self {
            symbol: symbol.to_string(),
            date: bar.timestamp.date_naive(),
            price: bar.close?,
            volume: bar.volume,
            open: bar.open,
            high: bar.high,
            low: bar.low,
        })
    }

    /// The row as a bar stamped at UTC midnight.
    pub fn to_bar(&self) -> RawBar {
        let timestamp = self
            .date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_default();
        RawBar {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: Some(self.price),
            volume: self.volume,
        }
    }
}

/// Storage interface for latest quotes.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Most recent row for `symbol` by timestamp.
    async fn latest_quote(&self, symbol: &str) -> Result<Option<QuoteRow>, StoreError>;

    /// Insert or replace by `(symbol, timestamp)`.
    async fn upsert_quote(&self, row: QuoteRow) -> Result<(), StoreError>;
}

/// Storage interface for daily price history.
#[async_trait]
pub trait PriceHistoryStore: Send + Sync {
    /// Rows with `from <= date <= to`, ascending by date.
    async fn price_range(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>, StoreError>;

    /// Insert or replace by `(symbol, date)`. Returns the number of rows written.
    async fn upsert_prices(&self, rows: Vec<PriceRow>) -> Result<usize, StoreError>;
}
