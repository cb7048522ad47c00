//! Quote and series resolution across cache, store and provider.

mod model;
mod service;
mod validation;

#[cfg(test)]
mod service_tests;

pub use model::{
    HistoricalSeries, HistoryQuery, IntradaySeries, QuoteOutcome, Resolution, StaleReason,
};
pub use service::{Resolver, ResolverBuilder};
pub use validation::{
    history_window, normalize_symbol, parse_interval, DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS,
    MAX_INTRADAY_DAYS,
};
