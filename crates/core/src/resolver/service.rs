//! Resolver service: cache, then store, then provider.
//!
//! Provider and store failures never escape a `resolve_*` call. They degrade
//! to stale data with a [`StaleReason`], to an empty series, or to one of the
//! explicit "no data" errors. Only validation errors are raised before I/O.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};
use futures::future::join_all;
use futures::FutureExt;
use log::{debug, error, info, warn};
use tickerline_market_data::{
    aggregate_bars, rollup_daily, AssetProfile, BarResolution, Bucketing, Candle, MarketDataError,
    MarketDataProvider, MissingPrice, ProviderQuote, RawBar,
};

use super::model::{
    HistoricalSeries, HistoryQuery, IntradaySeries, QuoteOutcome, Resolution, StaleReason,
};
use super::validation::{
    history_window, normalize_symbol, parse_interval, validate_days, MAX_INTRADAY_DAYS,
};
use crate::cache::{CacheTier, MemoryCache};
use crate::clock::{Clock, SystemClock};
use crate::config::ResolverConfig;
use crate::errors::{ResolverError, Result, ValidationError};
use crate::freshness::FreshnessPolicy;
use crate::store::{PriceHistoryStore, PriceRow, QuoteRow, QuoteStore};
use crate::tasks::BackgroundTasks;

/// Profiles change rarely; they are cached for a day.
const PROFILE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolves quotes, price history, candles and profiles for a symbol.
pub struct Resolver {
    config: ResolverConfig,
    freshness: FreshnessPolicy,
    provider: Arc<dyn MarketDataProvider>,
    quotes: Arc<dyn QuoteStore>,
    prices: Arc<dyn PriceHistoryStore>,
    quote_cache: Arc<dyn CacheTier<ProviderQuote>>,
    bar_cache: Arc<dyn CacheTier<Vec<RawBar>>>,
    profile_cache: Arc<dyn CacheTier<AssetProfile>>,
    clock: Arc<dyn Clock>,
    background: Option<Arc<dyn BackgroundTasks>>,
}

/// Builder for [`Resolver`]. Unset caches default to [`MemoryCache`] on the
/// chosen clock; the clock defaults to [`SystemClock`].
pub struct ResolverBuilder {
    config: ResolverConfig,
    provider: Arc<dyn MarketDataProvider>,
    quotes: Arc<dyn QuoteStore>,
    prices: Arc<dyn PriceHistoryStore>,
    quote_cache: Option<Arc<dyn CacheTier<ProviderQuote>>>,
    bar_cache: Option<Arc<dyn CacheTier<Vec<RawBar>>>>,
    profile_cache: Option<Arc<dyn CacheTier<AssetProfile>>>,
    clock: Option<Arc<dyn Clock>>,
    background: Option<Arc<dyn BackgroundTasks>>,
}

impl ResolverBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn quote_cache(mut self, cache: Arc<dyn CacheTier<ProviderQuote>>) -> Self {
        self.quote_cache = Some(cache);
        self
    }

    pub fn bar_cache(mut self, cache: Arc<dyn CacheTier<Vec<RawBar>>>) -> Self {
        self.bar_cache = Some(cache);
        self
    }

    pub fn profile_cache(mut self, cache: Arc<dyn CacheTier<AssetProfile>>) -> Self {
        self.profile_cache = Some(cache);
        self
    }

    pub fn background_tasks(mut self, sink: Arc<dyn BackgroundTasks>) -> Self {
        self.background = Some(sink);
        self
    }

    pub fn build(self) -> Resolver {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let quote_cache = self
            .quote_cache
            .unwrap_or_else(|| Arc::new(MemoryCache::<ProviderQuote>::with_clock(clock.clone())));
        let bar_cache = self
            .bar_cache
            .unwrap_or_else(|| Arc::new(MemoryCache::<Vec<RawBar>>::with_clock(clock.clone())));
        let profile_cache = self
            .profile_cache
            .unwrap_or_else(|| Arc::new(MemoryCache::<AssetProfile>::with_clock(clock.clone())));

        Resolver {
            freshness: FreshnessPolicy::new(self.config.polling_interval),
            config: self.config,
            provider: self.provider,
            quotes: self.quotes,
            prices: self.prices,
            quote_cache,
            bar_cache,
            profile_cache,
            clock,
            background: self.background,
        }
    }
}

impl Resolver {
    pub fn builder(
        config: ResolverConfig,
        provider: Arc<dyn MarketDataProvider>,
        quotes: Arc<dyn QuoteStore>,
        prices: Arc<dyn PriceHistoryStore>,
    ) -> ResolverBuilder {
        ResolverBuilder {
            config,
            provider,
            quotes,
            prices,
            quote_cache: None,
            bar_cache: None,
            profile_cache: None,
            clock: None,
            background: None,
        }
    }

    fn simulating(&self) -> bool {
        self.config.feature_flags.simulate_provider_failure
    }

    // =========================================================================
    // Quotes
    // =========================================================================

    /// Resolve the latest quote for `symbol`.
    pub async fn resolve_quote(&self, symbol: &str) -> Result<Resolution<ProviderQuote>> {
        let symbol = normalize_symbol(symbol)?;
        let key = format!("quote:{}", symbol);

        if let Some(quote) = self.quote_cache.get(&key, self.config.polling_interval) {
            debug!("Quote cache hit for {}", symbol);
            return Ok(Resolution::fresh(quote));
        }

        let stored = match self.quotes.latest_quote(&symbol).await {
            Ok(row) => row,
            Err(e) => {
                error!("Failed to read stored quote for {}: {}", symbol, e);
                None
            }
        };

        if let Some(row) = &stored {
            let verdict = self.freshness.evaluate_unix(row.timestamp, self.clock.now());
            if verdict.is_fresh {
                debug!("Serving stored quote for {} ({}s old)", symbol, verdict.age_seconds);
                return Ok(Resolution::fresh(row.to_quote()));
            }
        }

        if self.simulating() {
            warn!("Simulated provider outage, serving stored quote for {}", symbol);
            return stored
                .map(|row| Resolution::stale(row.to_quote(), StaleReason::SimulationMode))
                .ok_or(ResolverError::NotFound(symbol));
        }

        match self.provider.fetch_quote(&symbol).await {
            Ok(mut quote) => {
                info!("Fetched quote for {} from {}", symbol, self.provider.id());
                quote.symbol = symbol.clone();

                let row = QuoteRow::from_quote(&quote, self.clock.now());
                if let Err(e) = self.quotes.upsert_quote(row).await {
                    error!("Failed to persist quote for {}: {}", symbol, e);
                }
                self.quote_cache.set(&key, quote.clone(), self.config.cache_ttl());

                Ok(Resolution::fresh(quote))
            }
            Err(e) => {
                let reason = StaleReason::from_error(&e);
                warn!("Quote fetch for {} failed ({}): {}", symbol, reason, e);
                stored
                    .map(|row| Resolution::stale(row.to_quote(), reason))
                    .ok_or(ResolverError::NoDataAvailable(symbol))
            }
        }
    }

    /// Resolve quotes for many symbols concurrently.
    ///
    /// One outcome per input symbol, in input order. A failure for one
    /// symbol does not affect the others.
    pub async fn resolve_quotes_batch<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<QuoteOutcome> {
        let lookups = symbols.iter().map(|symbol| async move {
            let symbol = symbol.as_ref();
            QuoteOutcome {
                symbol: symbol.trim().to_uppercase(),
                result: self.resolve_quote(symbol).await,
            }
        });
        join_all(lookups).await
    }

    // =========================================================================
    // Daily history
    // =========================================================================

    /// Resolve stored daily prices for a window, backfilling from the provider
    /// when the window is empty or holds legacy rows without OHLC.
    pub async fn resolve_historical_series(
        &self,
        symbol: &str,
        query: HistoryQuery,
    ) -> Result<HistoricalSeries> {
        let symbol = normalize_symbol(symbol)?;
        let today = self.clock.today();
        let (from, to) = history_window(&query, today)?;

        let rows = read_prices(self.prices.as_ref(), &symbol, from, to).await;
        let needs_backfill = rows.is_empty() || rows.iter().any(|row| !row.has_complete_ohlc());

        let rows = if !needs_backfill {
            self.top_up_gap(&symbol, &rows, to, today).await;
            rows
        } else if self.simulating() {
            debug!("Simulated provider outage, skipping backfill for {}", symbol);
            rows
        } else {
            self.backfill(&symbol, from, to, rows).await
        };

        Ok(HistoricalSeries {
            symbol,
            from,
            to,
            rows,
        })
    }

    async fn backfill(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        current: Vec<PriceRow>,
    ) -> Vec<PriceRow> {
        info!("Backfilling {} daily prices {}..{}", symbol, from, to);
        match fetch_and_store_daily(self.provider.as_ref(), self.prices.as_ref(), symbol, from, to)
            .await
        {
            Ok(fetched) if fetched.is_empty() => {
                debug!("Backfill for {} returned nothing", symbol);
                current
            }
            Ok(fetched) => {
                let requeried = read_prices(self.prices.as_ref(), symbol, from, to).await;
                if requeried.is_empty() {
                    fetched
                } else {
                    requeried
                }
            }
            Err(e) => {
                warn!("Backfill for {} failed: {}", symbol, e);
                current
            }
        }
    }

    /// Fetch trading days missing after the newest stored row. Handed to the
    /// background sink when one is configured, otherwise awaited.
    async fn top_up_gap(&self, symbol: &str, rows: &[PriceRow], to: NaiveDate, today: NaiveDate) {
        if self.simulating() || to > today {
            return;
        }
        let Some(last) = rows.last() else {
            return;
        };
        let gap_from = last.date + ChronoDuration::days(1);
        if gap_from > to || !has_weekday(gap_from, to) {
            return;
        }

        let provider = self.provider.clone();
        let prices = self.prices.clone();
        let symbol = symbol.to_string();
        let task = async move {
            match fetch_and_store_daily(provider.as_ref(), prices.as_ref(), &symbol, gap_from, to)
                .await
            {
                Ok(rows) => debug!("Topped up {} rows for {}", rows.len(), symbol),
                Err(e) => warn!("Top-up for {} failed: {}", symbol, e),
            }
        };

        match &self.background {
            Some(sink) => sink.spawn("price-history-top-up", task.boxed()),
            None => task.await,
        }
    }

    // =========================================================================
    // Candles
    // =========================================================================

    /// Resolve intraday candles at `interval` (e.g. `"4h"`) over the last
    /// `days` days (1..=30).
    ///
    /// Bars are fetched at the coarsest native resolution that tiles the
    /// interval and cached per symbol, resolution and day count.
    pub async fn resolve_intraday_series(
        &self,
        symbol: &str,
        interval: &str,
        days: i64,
    ) -> Result<Resolution<IntradaySeries>> {
        let symbol = normalize_symbol(symbol)?;
        let spec = parse_interval(interval)?;
        let days = validate_days(days, 1, MAX_INTRADAY_DAYS)?;
        let resolution = BarResolution::coarsest_dividing(spec.minutes());

        let series = |candles: Vec<Candle>| IntradaySeries {
            symbol: symbol.clone(),
            interval: interval.to_string(),
            source_resolution: resolution,
            candles,
        };

        let key = format!("bars:{}:{}:{}", symbol, resolution, days);
        let bars = match self.bar_cache.get(&key, self.config.polling_interval) {
            Some(bars) => {
                debug!("Bar cache hit for {}", key);
                bars
            }
            None => {
                if self.simulating() {
                    return Ok(Resolution::stale(series(Vec::new()), StaleReason::SimulationMode));
                }
                let to = self.clock.today();
                let from = to - ChronoDuration::days(days);
                match self.provider.fetch_bars(&symbol, from, to, resolution).await {
                    Ok(bars) => {
                        if !bars.is_empty() {
                            self.bar_cache.set(&key, bars.clone(), self.config.cache_ttl());
                        }
                        bars
                    }
                    Err(e) => {
                        let reason = StaleReason::from_error(&e);
                        warn!("Intraday fetch for {} failed ({}): {}", symbol, reason, e);
                        return Ok(Resolution::stale(series(Vec::new()), reason));
                    }
                }
            }
        };

        let candles = aggregate_bars(&bars, Bucketing::Fixed(spec), MissingPrice::Disqualify);
        Ok(Resolution::fresh(series(candles)))
    }

    /// Resolve calendar-day candles for `[from, to]` rolled up from hourly
    /// provider bars.
    ///
    /// When the provider is unavailable the stored daily rows are rolled up
    /// instead and the result is marked stale.
    pub async fn resolve_daily_rollup(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Resolution<Vec<Candle>>> {
        let symbol = normalize_symbol(symbol)?;
        if from > to {
            return Err(ValidationError::InvalidDateRange { from, to }.into());
        }

        let key = format!("bars:{}:{}:{}:{}", symbol, BarResolution::OneHour, from, to);
        if let Some(bars) = self.bar_cache.get(&key, self.config.polling_interval) {
            return Ok(Resolution::fresh(rollup_daily(&bars)));
        }

        let failure = if self.simulating() {
            StaleReason::SimulationMode
        } else {
            match self
                .provider
                .fetch_bars(&symbol, from, to, BarResolution::OneHour)
                .await
            {
                Ok(bars) => {
                    if !bars.is_empty() {
                        self.bar_cache.set(&key, bars.clone(), self.config.cache_ttl());
                    }
                    return Ok(Resolution::fresh(rollup_daily(&bars)));
                }
                Err(e) => {
                    let reason = StaleReason::from_error(&e);
                    warn!("Hourly fetch for {} failed ({}): {}", symbol, reason, e);
                    reason
                }
            }
        };

        let stored: Vec<RawBar> = read_prices(self.prices.as_ref(), &symbol, from, to)
            .await
            .iter()
            .map(PriceRow::to_bar)
            .collect();
        Ok(Resolution::stale(rollup_daily(&stored), failure))
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Resolve the asset profile. Never fails on provider errors; a bare
    /// profile marked stale is returned instead.
    pub async fn resolve_profile(&self, symbol: &str) -> Result<Resolution<AssetProfile>> {
        let symbol = normalize_symbol(symbol)?;
        let key = format!("profile:{}", symbol);

        if let Some(profile) = self.profile_cache.get(&key, PROFILE_TTL) {
            return Ok(Resolution::fresh(profile));
        }

        if self.simulating() {
            return Ok(Resolution::stale(
                AssetProfile::for_symbol(symbol),
                StaleReason::SimulationMode,
            ));
        }

        match self.provider.fetch_profile(&symbol).await {
            Ok(mut profile) => {
                profile.symbol = symbol;
                self.profile_cache.set(&key, profile.clone(), PROFILE_TTL);
                Ok(Resolution::fresh(profile))
            }
            Err(e) => {
                let reason = StaleReason::from_error(&e);
                warn!("Profile fetch for {} failed ({}): {}", symbol, reason, e);
                Ok(Resolution::stale(AssetProfile::for_symbol(symbol), reason))
            }
        }
    }
}

/// Store reads that fail are logged and read as empty.
async fn read_prices(
    prices: &dyn PriceHistoryStore,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<PriceRow> {
    match prices.price_range(symbol, from, to).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to read price history for {}: {}", symbol, e);
            Vec::new()
        }
    }
}

/// Fetch daily bars for `[from, to]` and upsert them. Returns the rows built
/// from the fetched bars; a failed upsert is logged, not returned.
async fn fetch_and_store_daily(
    provider: &dyn MarketDataProvider,
    prices: &dyn PriceHistoryStore,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> std::result::Result<Vec<PriceRow>, MarketDataError> {
    let bars = provider
        .fetch_bars(symbol, from, to, BarResolution::Daily)
        .await?;
    let rows: Vec<PriceRow> = bars
        .iter()
        .filter_map(|bar| PriceRow::from_bar(symbol, bar))
        .collect();

    if !rows.is_empty() {
        if let Err(e) = prices.upsert_prices(rows.clone()).await {
            error!("Failed to persist {} price rows for {}: {}", rows.len(), symbol, e);
        }
    }
    Ok(rows)
}

fn has_weekday(from: NaiveDate, to: NaiveDate) -> bool {
    from.iter_days()
        .take_while(|day| *day <= to)
        .take(7)
        .any(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
}
