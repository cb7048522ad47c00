use chrono::{Duration, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tickerline_market_data::IntervalSpec;

use super::model::HistoryQuery;
use crate::errors::ValidationError;

pub const DEFAULT_HISTORY_DAYS: i64 = 180;
pub const MAX_HISTORY_DAYS: i64 = 3650;
pub const MAX_INTRADAY_DAYS: i64 = 30;

lazy_static! {
    static ref SYMBOL_PATTERN: Regex = Regex::new(r"^[A-Z0-9.\-^=]{1,20}$").unwrap();
}

/// Trim and uppercase; reject anything outside `A-Z 0-9 . - ^ =` or longer
/// than 20 characters.
pub fn normalize_symbol(raw: &str) -> Result<String, ValidationError> {
    let symbol = raw.trim().to_uppercase();
    if SYMBOL_PATTERN.is_match(&symbol) {
        Ok(symbol)
    } else {
        Err(ValidationError::InvalidSymbol(raw.to_string()))
    }
}

pub fn validate_days(days: i64, min: i64, max: i64) -> Result<i64, ValidationError> {
    if (min..=max).contains(&days) {
        Ok(days)
    } else {
        Err(ValidationError::DaysOutOfRange { days, min, max })
    }
}

pub fn parse_interval(spec: &str) -> Result<IntervalSpec, ValidationError> {
    spec.parse()
        .map_err(|_| ValidationError::InvalidInterval(spec.to_string()))
}

/// Inclusive `(from, to)` for a history query.
///
/// - both bounds: used as given, `from <= to` required
/// - only `from`: `to` is today
/// - only `to`: `from` is `days` (default 180) before it
/// - neither: the last `days` up to today
pub fn history_window(
    query: &HistoryQuery,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let days = match query.days {
        Some(days) => validate_days(days, 1, MAX_HISTORY_DAYS)?,
        None => DEFAULT_HISTORY_DAYS,
    };

    let (from, to) = match (query.from, query.to) {
        (Some(from), Some(to)) => (from, to),
        (Some(from), None) => (from, today),
        (None, Some(to)) => (to - Duration::days(days), to),
        (None, None) => (today - Duration::days(days), today),
    };

    if from > to {
        return Err(ValidationError::InvalidDateRange { from, to });
    }
    Ok((from, to))
}
