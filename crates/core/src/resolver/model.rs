use std::fmt;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tickerline_market_data::{BarResolution, Candle, FailureKind, MarketDataError, ProviderQuote};

use crate::errors::ResolverError;
use crate::store::PriceRow;

/// Why a response is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    SimulationMode,
    ProviderNetworkError,
    ProviderApiError,
    ProviderInvalidData,
}

impl StaleReason {
    pub fn from_error(error: &MarketDataError) -> Self {
        match error.failure_kind() {
            FailureKind::Network => StaleReason::ProviderNetworkError,
            FailureKind::Api => StaleReason::ProviderApiError,
            FailureKind::InvalidData => StaleReason::ProviderInvalidData,
        }
    }

    /// Wire code, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            StaleReason::SimulationMode => "simulation_mode",
            StaleReason::ProviderNetworkError => "provider_network_error",
            StaleReason::ProviderApiError => "provider_api_error",
            StaleReason::ProviderInvalidData => "provider_invalid_data",
        }
    }
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved value and whether it is stale.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution<T> {
    pub data: T,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_reason: Option<StaleReason>,
}

impl<T> Resolution<T> {
    pub fn fresh(data: T) -> Self {
        Self {
            data,
            stale: false,
            stale_reason: None,
        }
    }

    pub fn stale(data: T, reason: StaleReason) -> Self {
        Self {
            data,
            stale: true,
            stale_reason: Some(reason),
        }
    }
}

/// Historical range request. Unset bounds are derived from `days`
/// (default 180) and today.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub days: Option<i64>,
}

impl HistoryQuery {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            days: None,
        }
    }

    pub fn last_days(days: i64) -> Self {
        Self {
            days: Some(days),
            ..Default::default()
        }
    }
}

/// Stored daily prices for an inclusive date window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoricalSeries {
    pub symbol: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<PriceRow>,
}

/// Intraday candles at a requested interval.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntradaySeries {
    pub symbol: String,
    pub interval: String,
    /// Native provider resolution the candles were built from.
    pub source_resolution: BarResolution,
    pub candles: Vec<Candle>,
}

/// One entry of a batch quote resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct QuoteOutcome {
    pub symbol: String,
    pub result: Result<Resolution<ProviderQuote>, ResolverError>,
}

impl Serialize for QuoteOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("symbol", &self.symbol)?;
        match &self.result {
            Ok(resolution) => map.serialize_entry("quote", resolution)?,
            Err(err) => map.serialize_entry("error", &err.to_string())?,
        }
        map.end()
    }
}
