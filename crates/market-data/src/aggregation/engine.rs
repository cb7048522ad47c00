use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use super::IntervalSpec;
use crate::errors::MarketDataError;
use crate::models::{Candle, RawBar};

/// How bars are assigned to buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucketing {
    /// `floor(epoch_ms / interval_ms) * interval_ms`.
    Fixed(IntervalSpec),
    /// UTC calendar date of the bar's timestamp.
    CalendarDay,
}

/// What to do with a bar that lacks one or more of open/high/low/close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingPrice {
    /// The bar does not contribute to its bucket.
    Disqualify,
    /// Missing open/high/low are taken from close. Bars without a close
    /// are still excluded.
    FillFromClose,
}

/// Aggregate bars into `interval` candles, e.g. `"4h"` or `"30m"`.
///
/// Bars missing any price are excluded. Returns candles ascending by bucket.
pub fn aggregate(bars: &[RawBar], interval: &str) -> Result<Vec<Candle>, MarketDataError> {
    let spec: IntervalSpec = interval.parse()?;
    Ok(aggregate_bars(bars, Bucketing::Fixed(spec), MissingPrice::Disqualify))
}

/// Roll bars up into one candle per UTC calendar day.
///
/// Legacy rows that only carry a close still count, priced flat at close.
pub fn rollup_daily(bars: &[RawBar]) -> Vec<Candle> {
    aggregate_bars(bars, Bucketing::CalendarDay, MissingPrice::FillFromClose)
}

struct Accumulator {
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl Accumulator {
    fn start(prices: Prices, volume: Decimal) -> Self {
        Self {
            open: prices.open,
            high: prices.high,
            low: prices.low,
            close: prices.close,
            volume,
        }
    }

    fn merge(&mut self, prices: Prices, volume: Decimal) {
        self.high = self.high.max(prices.high);
        self.low = self.low.min(prices.low);
        self.close = prices.close;
        self.volume += volume;
    }
}

#[derive(Clone, Copy)]
struct Prices {
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
}

fn eligible_prices(bar: &RawBar, missing: MissingPrice) -> Option<Prices> {
    match missing {
        MissingPrice::Disqualify => Some(Prices {
            open: bar.open?,
            high: bar.high?,
            low: bar.low?,
            close: bar.close?,
        }),
        MissingPrice::FillFromClose => {
            let close = bar.close?;
            Some(Prices {
                open: bar.open.unwrap_or(close),
                high: bar.high.unwrap_or(close),
                low: bar.low.unwrap_or(close),
                close,
            })
        }
    }
}

fn bucket_key(timestamp: &DateTime<Utc>, bucketing: Bucketing) -> i64 {
    match bucketing {
        Bucketing::Fixed(spec) => {
            let interval_ms = spec.millis();
            timestamp.timestamp_millis().div_euclid(interval_ms) * interval_ms
        }
        Bucketing::CalendarDay => timestamp
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp_millis())
            .unwrap_or_else(|| timestamp.timestamp_millis()),
    }
}

type SortKey = (
    DateTime<Utc>,
    Option<Decimal>,
    Option<Decimal>,
    Option<Decimal>,
    Option<Decimal>,
    Option<Decimal>,
);

/// Total order over bars: timestamp, then open, high, low, close, volume.
fn sort_key(bar: &RawBar) -> SortKey {
    (bar.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume)
}

/// Group `bars` into buckets and emit one candle per non-empty bucket.
///
/// Input order does not matter. Bars are sorted by timestamp first, and bars
/// sharing a timestamp are ordered by their prices and volume, so the lowest
/// such bar supplies the open and the highest supplies the close.
pub fn aggregate_bars(bars: &[RawBar], bucketing: Bucketing, missing: MissingPrice) -> Vec<Candle> {
    let mut sorted: Vec<&RawBar> = bars.iter().collect();
    sorted.sort_by_key(|bar| sort_key(bar));

    let mut buckets: BTreeMap<i64, Accumulator> = BTreeMap::new();
    for bar in sorted {
        let Some(prices) = eligible_prices(bar, missing) else {
            continue;
        };
        let volume = bar.volume.unwrap_or(Decimal::ZERO);

        buckets
            .entry(bucket_key(&bar.timestamp, bucketing))
            .and_modify(|acc| acc.merge(prices, volume))
            .or_insert_with(|| Accumulator::start(prices, volume));
    }

    buckets
        .into_iter()
        .filter_map(|(start_ms, acc)| {
            let bucket_start = Utc.timestamp_millis_opt(start_ms).single()?;
            Some(Candle {
                bucket_start,
                open: acc.open,
                high: acc.high,
                low: acc.low,
                close: acc.close,
                volume: acc.volume,
            })
        })
        .collect()
}
