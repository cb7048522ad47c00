//! Normalization of heterogeneous provider payloads into canonical models.
//!
//! The same resource comes back array-wrapped or bare, with or without a
//! `{historical: [...]}` / `{profile: {...}}` wrapper, and with field names
//! that changed between API versions. Everything here is pure and operates
//! on `serde_json::Value`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::errors::MarketDataError;
use crate::models::{AssetProfile, ProviderQuote, RawBar};

pub const DESCRIPTION_SOURCE_PROVIDER: &str = "FMP";

/// A numeric field as found in a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericField {
    /// Missing or `null`.
    Absent,
    Value(Decimal),
    /// Present but not a number.
    Invalid,
}

/// Flatten a payload into its record objects.
///
/// Accepts a bare array, a single object, or a `{historical: [...]}` wrapper.
pub fn records(payload: &Value) -> Vec<&Map<String, Value>> {
    match payload {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(object) => match object.get("historical") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            _ => vec![object],
        },
        _ => Vec::new(),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim().trim_end_matches('%');
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Read the first present alias of a numeric field.
pub fn numeric_field(record: &Map<String, Value>, keys: &[&str]) -> NumericField {
    let Some(value) = keys.iter().find_map(|key| record.get(*key)) else {
        return NumericField::Absent;
    };
    match value {
        Value::Null => NumericField::Absent,
        Value::Number(n) => parse_decimal(&n.to_string())
            .map(NumericField::Value)
            .unwrap_or(NumericField::Invalid),
        Value::String(s) => parse_decimal(s)
            .map(NumericField::Value)
            .unwrap_or(NumericField::Invalid),
        _ => NumericField::Invalid,
    }
}

/// Lenient read for optional quote/profile fields: invalid means absent.
fn optional_decimal(record: &Map<String, Value>, keys: &[&str]) -> Option<Decimal> {
    match numeric_field(record, keys) {
        NumericField::Value(v) => Some(v),
        _ => None,
    }
}

fn string_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        record
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn invalid(provider: &str, message: impl Into<String>) -> MarketDataError {
    MarketDataError::InvalidPayload {
        provider: provider.to_string(),
        message: message.into(),
    }
}

/// Normalize a quote payload.
///
/// The first record carrying both `symbol` and a numeric `price` wins.
/// `fetched_at` (unix seconds) stands in when the payload has no timestamp.
pub fn normalize_quote(
    provider: &str,
    payload: &Value,
    fetched_at: i64,
) -> Result<ProviderQuote, MarketDataError> {
    let rows = records(payload);
    if rows.is_empty() {
        return Err(MarketDataError::NoData(format!("{}: empty quote payload", provider)));
    }

    let record = rows
        .into_iter()
        .find(|r| {
            string_field(r, &["symbol"]).is_some()
                && matches!(numeric_field(r, &["price"]), NumericField::Value(_))
        })
        .ok_or_else(|| invalid(provider, "quote payload lacks symbol/price"))?;

    let symbol = string_field(record, &["symbol"]).unwrap_or_default();
    let price = optional_decimal(record, &["price"]).unwrap_or_default();
    let timestamp = record
        .get("timestamp")
        .and_then(Value::as_i64)
        .filter(|ts| *ts > 0)
        .unwrap_or(fetched_at);

    Ok(ProviderQuote {
        symbol,
        name: string_field(record, &["name", "companyName"]),
        price,
        change: optional_decimal(record, &["change"]),
        change_percentage: optional_decimal(
            record,
            &["changePercentage", "changesPercentage", "changePercent"],
        ),
        day_low: optional_decimal(record, &["dayLow", "low"]),
        day_high: optional_decimal(record, &["dayHigh", "high"]),
        open: optional_decimal(record, &["open"]),
        previous_close: optional_decimal(record, &["previousClose"]),
        volume: optional_decimal(record, &["volume"]),
        market_cap: optional_decimal(record, &["marketCap"]),
        exchange: string_field(record, &["exchange", "exchangeShortName"]),
        timestamp,
    })
}

/// Parse a bar date: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, or
/// `YYYY-MM-DDTHH:MM:SS` with optional fraction and `Z`/offset.
/// Naive datetimes are taken as UTC.
pub fn parse_bar_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse one bar record. `None` when the timestamp is unusable or a price
/// or volume field is present but not numeric.
pub fn parse_bar(record: &Map<String, Value>) -> Option<RawBar> {
    let timestamp = string_field(record, &["date", "publishedDate"])
        .as_deref()
        .and_then(parse_bar_timestamp)?;

    let field = |keys: &[&str]| match numeric_field(record, keys) {
        NumericField::Absent => Some(None),
        NumericField::Value(v) => Some(Some(v)),
        NumericField::Invalid => None,
    };

    Some(RawBar {
        timestamp,
        open: field(&["open"])?,
        high: field(&["high"])?,
        low: field(&["low"])?,
        close: field(&["close", "price"])?,
        volume: field(&["volume"])?,
    })
}

/// Normalize a bar payload, ascending by timestamp.
///
/// An empty payload is [`MarketDataError::NoData`]; a payload whose records
/// all fail to parse is [`MarketDataError::InvalidPayload`].
pub fn normalize_bars(provider: &str, payload: &Value) -> Result<Vec<RawBar>, MarketDataError> {
    let rows = records(payload);
    if rows.is_empty() {
        return Err(MarketDataError::NoData(format!("{}: empty bar payload", provider)));
    }

    let mut bars: Vec<RawBar> = rows.into_iter().filter_map(parse_bar).collect();
    if bars.is_empty() {
        return Err(invalid(provider, "no parsable bars in payload"));
    }
    bars.sort_by_key(|bar| bar.timestamp);
    Ok(bars)
}

/// Normalize a profile payload, unwrapping a nested `profile` object.
pub fn normalize_profile(
    provider: &str,
    symbol: &str,
    payload: &Value,
) -> Result<AssetProfile, MarketDataError> {
    let rows = records(payload);
    if rows.is_empty() {
        return Err(MarketDataError::NoData(format!("{}: empty profile payload", provider)));
    }

    let record = rows
        .into_iter()
        .map(|r| match r.get("profile") {
            Some(Value::Object(nested)) => nested,
            Some(Value::Array(items)) => items.iter().find_map(Value::as_object).unwrap_or(r),
            _ => r,
        })
        .find(|r| string_field(r, &["companyName", "name"]).is_some())
        .ok_or_else(|| invalid(provider, "profile payload lacks companyName"))?;

    let description = string_field(record, &["description"]);
    let description_source = description
        .as_ref()
        .map(|_| DESCRIPTION_SOURCE_PROVIDER.to_string());

    Ok(AssetProfile {
        symbol: symbol.to_string(),
        name: string_field(record, &["companyName", "name"]),
        description,
        description_source,
        sector: string_field(record, &["sector"]),
        industry: string_field(record, &["industry"]),
        website: string_field(record, &["website"]),
        exchange: string_field(record, &["exchangeShortName", "exchange"]),
        country: string_field(record, &["country"]),
        image: string_field(record, &["image"]),
    })
}
