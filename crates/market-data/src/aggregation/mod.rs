//! OHLCV aggregation engine.
//!
//! One engine serves both the intraday path (30-minute bars into arbitrary
//! `<n>h` / `<n>m` candles) and the daily rollup (hourly bars into calendar-day
//! candles). The two differ only in how bars are bucketed and in how bars with
//! missing prices are treated, and both are explicit parameters of
//! [`aggregate_bars`].

mod engine;
mod interval;

pub use engine::{aggregate, aggregate_bars, rollup_daily, Bucketing, MissingPrice};
pub use interval::IntervalSpec;
