//! Tests for the Resolver's tier ordering, fallbacks and backfill rules.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use futures::future::BoxFuture;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tickerline_market_data::{
        AssetProfile, BarResolution, MarketDataError, MarketDataProvider, ProviderQuote, RawBar,
    };

    use crate::clock::{Clock, FixedClock};
    use crate::config::{ProviderConfig, ResolverConfig};
    use crate::errors::{ResolverError, StoreError, ValidationError};
    use crate::resolver::{HistoryQuery, Resolver, StaleReason};
    use crate::store::{PriceHistoryStore, PriceRow, QuoteRow, QuoteStore};
    use crate::tasks::BackgroundTasks;

    type ProviderResult<T> = std::result::Result<T, MarketDataError>;

    // =========================================================================
    // Mock provider
    // =========================================================================

    #[derive(Default)]
    struct MockProvider {
        quote: Mutex<Option<ProviderResult<ProviderQuote>>>,
        failing_symbols: Mutex<Vec<String>>,
        bars: Mutex<Option<ProviderResult<Vec<RawBar>>>>,
        profile: Mutex<Option<ProviderResult<AssetProfile>>>,
        quote_calls: AtomicUsize,
        bar_calls: Mutex<Vec<(NaiveDate, NaiveDate, BarResolution)>>,
        profile_calls: AtomicUsize,
    }

    impl MockProvider {
        fn quote_returns(&self, result: ProviderResult<ProviderQuote>) {
            *self.quote.lock().unwrap() = Some(result);
        }

        fn fail_symbol(&self, symbol: &str) {
            self.failing_symbols.lock().unwrap().push(symbol.to_string());
        }

        fn bars_return(&self, result: ProviderResult<Vec<RawBar>>) {
            *self.bars.lock().unwrap() = Some(result);
        }

        fn profile_returns(&self, result: ProviderResult<AssetProfile>) {
            *self.profile.lock().unwrap() = Some(result);
        }

        fn quote_calls(&self) -> usize {
            self.quote_calls.load(Ordering::SeqCst)
        }

        fn bar_calls(&self) -> Vec<(NaiveDate, NaiveDate, BarResolution)> {
            self.bar_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            "MOCK"
        }

        async fn fetch_quote(&self, symbol: &str) -> ProviderResult<ProviderQuote> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing_symbols.lock().unwrap().iter().any(|s| s == symbol) {
                return Err(MarketDataError::Network {
                    provider: "MOCK".to_string(),
                    message: "connection reset".to_string(),
                });
            }
            self.quote
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(MarketDataError::NoData(symbol.to_string())))
        }

        async fn fetch_bars(
            &self,
            _symbol: &str,
            from: NaiveDate,
            to: NaiveDate,
            resolution: BarResolution,
        ) -> ProviderResult<Vec<RawBar>> {
            self.bar_calls.lock().unwrap().push((from, to, resolution));
            let bars = self.bars.lock().unwrap().clone().unwrap_or(Ok(Vec::new()))?;
            Ok(bars
                .into_iter()
                .filter(|b| {
                    let day = b.timestamp.date_naive();
                    day >= from && day <= to
                })
                .collect())
        }

        async fn fetch_profile(&self, symbol: &str) -> ProviderResult<AssetProfile> {
            self.profile_calls.fetch_add(1, Ordering::SeqCst);
            self.profile
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(MarketDataError::NoData(symbol.to_string())))
        }
    }

    // =========================================================================
    // Mock stores
    // =========================================================================

    #[derive(Default)]
    struct MockQuoteStore {
        rows: Mutex<Vec<QuoteRow>>,
        reads: AtomicUsize,
        fail_reads: AtomicBool,
    }

    impl MockQuoteStore {
        fn add(&self, row: QuoteRow) {
            self.rows.lock().unwrap().push(row);
        }

        fn all(&self) -> Vec<QuoteRow> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuoteStore for MockQuoteStore {
        async fn latest_quote(&self, symbol: &str) -> Result<Option<QuoteRow>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Database("disk I/O error".to_string()));
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.symbol == symbol)
                .max_by_key(|r| r.timestamp)
                .cloned())
        }

        async fn upsert_quote(&self, row: QuoteRow) -> Result<(), StoreError> {
            let mut rows = self.rows.lock().unwrap();
            rows.retain(|r| !(r.symbol == row.symbol && r.timestamp == row.timestamp));
            rows.push(row);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockPriceStore {
        rows: Mutex<Vec<PriceRow>>,
        range_calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
        fail_upserts: AtomicBool,
    }

    impl MockPriceStore {
        fn add(&self, row: PriceRow) {
            self.rows.lock().unwrap().push(row);
        }

        fn range_calls(&self) -> Vec<(NaiveDate, NaiveDate)> {
            self.range_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PriceHistoryStore for MockPriceStore {
        async fn price_range(
            &self,
            symbol: &str,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<PriceRow>, StoreError> {
            self.range_calls.lock().unwrap().push((from, to));
            let mut rows: Vec<PriceRow> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.symbol == symbol && r.date >= from && r.date <= to)
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.date);
            Ok(rows)
        }

        async fn upsert_prices(&self, new_rows: Vec<PriceRow>) -> Result<usize, StoreError> {
            if self.fail_upserts.load(Ordering::SeqCst) {
                return Err(StoreError::WriterClosed);
            }
            let mut rows = self.rows.lock().unwrap();
            let count = new_rows.len();
            for row in new_rows {
                rows.retain(|r| !(r.symbol == row.symbol && r.date == row.date));
                rows.push(row);
            }
            Ok(count)
        }
    }

    // =========================================================================
    // Recording background sink
    // =========================================================================

    #[derive(Default)]
    struct RecordingTasks {
        tasks: Mutex<Vec<BoxFuture<'static, ()>>>,
    }

    impl RecordingTasks {
        fn pending(&self) -> usize {
            self.tasks.lock().unwrap().len()
        }

        async fn run_all(&self) {
            let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
            for task in tasks {
                task.await;
            }
        }
    }

    impl BackgroundTasks for RecordingTasks {
        fn spawn(&self, _name: &'static str, task: BoxFuture<'static, ()>) {
            self.tasks.lock().unwrap().push(task);
        }
    }

    // =========================================================================
    // Harness
    // =========================================================================

    struct Harness {
        resolver: Resolver,
        provider: Arc<MockProvider>,
        quotes: Arc<MockQuoteStore>,
        prices: Arc<MockPriceStore>,
        clock: Arc<FixedClock>,
    }

    /// Wednesday 2024-03-06 15:00 UTC.
    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 15, 0, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn build(simulate: bool, sink: Option<Arc<dyn BackgroundTasks>>, now: DateTime<Utc>) -> Harness {
        let mut config = ResolverConfig::new(ProviderConfig::new("test-key"));
        config.feature_flags.simulate_provider_failure = simulate;

        let provider = Arc::new(MockProvider::default());
        let quotes = Arc::new(MockQuoteStore::default());
        let prices = Arc::new(MockPriceStore::default());
        let clock = Arc::new(FixedClock::new(now));

        let mut builder = Resolver::builder(config, provider.clone(), quotes.clone(), prices.clone())
            .clock(clock.clone());
        if let Some(sink) = sink {
            builder = builder.background_tasks(sink);
        }

        Harness {
            resolver: builder.build(),
            provider,
            quotes,
            prices,
            clock,
        }
    }

    fn harness() -> Harness {
        build(false, None, start_time())
    }

    fn quote_row(symbol: &str, price: Decimal, at: DateTime<Utc>) -> QuoteRow {
        QuoteRow {
            symbol: symbol.to_string(),
            price,
            day_low: None,
            day_high: None,
            volume: Some(dec!(1000)),
            timestamp: at.timestamp(),
        }
    }

    fn daily_bar(date: NaiveDate, close: Decimal) -> RawBar {
        let ts = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        RawBar::ohlcv(ts, close - dec!(1), close + dec!(1), close - dec!(2), close, dec!(500))
    }

    fn complete_row(symbol: &str, date: NaiveDate, close: Decimal) -> PriceRow {
        PriceRow::from_bar(symbol, &daily_bar(date, close)).unwrap()
    }

    fn legacy_row(symbol: &str, date: NaiveDate, close: Decimal) -> PriceRow {
        PriceRow {
            symbol: symbol.to_string(),
            date,
            price: close,
            volume: None,
            open: None,
            high: None,
            low: None,
        }
    }

    fn timeout() -> MarketDataError {
        MarketDataError::Timeout {
            provider: "MOCK".to_string(),
        }
    }

    // =========================================================================
    // resolve_quote
    // =========================================================================

    #[tokio::test]
    async fn test_cache_hit_skips_store_and_provider() {
        let h = harness();
        h.provider
            .quote_returns(Ok(ProviderQuote::new("AAPL", dec!(189.5), start_time().timestamp())));

        let first = h.resolver.resolve_quote("aapl").await.unwrap();
        assert!(!first.stale);
        assert_eq!(h.provider.quote_calls(), 1);
        assert_eq!(h.quotes.reads.load(Ordering::SeqCst), 1);

        h.clock.advance(Duration::seconds(30));
        let second = h.resolver.resolve_quote("AAPL").await.unwrap();
        assert_eq!(second.data.price, dec!(189.5));
        assert!(!second.stale);
        assert_eq!(h.provider.quote_calls(), 1);
        assert_eq!(h.quotes.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_fetch_writes_through() {
        let h = harness();
        h.provider
            .quote_returns(Ok(ProviderQuote::new("aapl", dec!(190), 1)));

        let resolved = h.resolver.resolve_quote(" aapl ").await.unwrap();
        assert_eq!(resolved.data.symbol, "AAPL");

        let stored = h.quotes.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].symbol, "AAPL");
        assert_eq!(stored[0].price, dec!(190));
        assert_eq!(stored[0].timestamp, start_time().timestamp());
    }

    #[tokio::test]
    async fn test_expired_cache_and_stale_row_refetch() {
        let h = harness();
        h.provider
            .quote_returns(Ok(ProviderQuote::new("AAPL", dec!(189.5), 0)));

        h.resolver.resolve_quote("AAPL").await.unwrap();
        h.clock.advance(Duration::seconds(61));
        h.resolver.resolve_quote("AAPL").await.unwrap();

        assert_eq!(h.provider.quote_calls(), 2);
    }

    #[tokio::test]
    async fn test_fresh_store_row_skips_provider() {
        let h = harness();
        h.quotes
            .add(quote_row("AAPL", dec!(188), start_time() - Duration::seconds(30)));

        let resolved = h.resolver.resolve_quote("AAPL").await.unwrap();
        assert!(!resolved.stale);
        assert_eq!(resolved.data.price, dec!(188));
        assert_eq!(h.provider.quote_calls(), 0);
    }

    #[tokio::test]
    async fn test_simulation_serves_stale_row_without_provider() {
        let h = build(true, None, start_time());
        h.quotes
            .add(quote_row("AAPL", dec!(150), start_time() - Duration::hours(3)));

        let resolved = h.resolver.resolve_quote("AAPL").await.unwrap();
        assert!(resolved.stale);
        assert_eq!(resolved.stale_reason, Some(StaleReason::SimulationMode));
        assert_eq!(resolved.data.price, dec!(150));
        assert_eq!(h.provider.quote_calls(), 0);

        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["stale_reason"], "simulation_mode");
    }

    #[tokio::test]
    async fn test_simulation_without_row_is_not_found() {
        let h = build(true, None, start_time());
        let err = h.resolver.resolve_quote("AAPL").await.unwrap_err();
        assert_eq!(err, ResolverError::NotFound("AAPL".to_string()));
        assert_eq!(h.provider.quote_calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_with_reason() {
        let cases = [
            (timeout(), StaleReason::ProviderNetworkError),
            (
                MarketDataError::HttpStatus {
                    provider: "MOCK".to_string(),
                    status: 500,
                },
                StaleReason::ProviderApiError,
            ),
            (
                MarketDataError::ProviderError {
                    provider: "MOCK".to_string(),
                    message: "Limit Reach".to_string(),
                },
                StaleReason::ProviderApiError,
            ),
            (
                MarketDataError::InvalidPayload {
                    provider: "MOCK".to_string(),
                    message: "missing price".to_string(),
                },
                StaleReason::ProviderInvalidData,
            ),
        ];

        for (error, expected) in cases {
            let h = harness();
            h.quotes
                .add(quote_row("AAPL", dec!(150), start_time() - Duration::hours(1)));
            h.provider.quote_returns(Err(error));

            let resolved = h.resolver.resolve_quote("AAPL").await.unwrap();
            assert!(resolved.stale);
            assert_eq!(resolved.stale_reason, Some(expected));
            assert_eq!(resolved.data.price, dec!(150));
        }
    }

    #[tokio::test]
    async fn test_empty_store_and_failing_provider_is_no_data() {
        let h = harness();
        h.provider.quote_returns(Err(timeout()));

        let err = h.resolver.resolve_quote("AAPL").await.unwrap_err();
        assert_eq!(err, ResolverError::NoDataAvailable("AAPL".to_string()));
    }

    #[tokio::test]
    async fn test_store_read_error_is_treated_as_no_row() {
        let h = harness();
        h.quotes.fail_reads.store(true, Ordering::SeqCst);
        h.provider.quote_returns(Err(timeout()));

        let err = h.resolver.resolve_quote("AAPL").await.unwrap_err();
        assert_eq!(err, ResolverError::NoDataAvailable("AAPL".to_string()));

        h.provider
            .quote_returns(Ok(ProviderQuote::new("AAPL", dec!(1), 0)));
        assert!(h.resolver.resolve_quote("AAPL").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_rejected_before_io() {
        let h = harness();
        let err = h.resolver.resolve_quote("  ").await.unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Validation(ValidationError::InvalidSymbol(_))
        ));
        assert_eq!(h.quotes.reads.load(Ordering::SeqCst), 0);
        assert_eq!(h.provider.quote_calls(), 0);
    }

    // =========================================================================
    // resolve_quotes_batch
    // =========================================================================

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let h = harness();
        h.provider
            .quote_returns(Ok(ProviderQuote::new("X", dec!(10), 0)));
        h.provider.fail_symbol("ZZZ");

        let outcomes = h
            .resolver
            .resolve_quotes_batch(&["aapl", "ZZZ", "bad symbol", "msft"])
            .await;

        let symbols: Vec<_> = outcomes.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "ZZZ", "BAD SYMBOL", "MSFT"]);

        assert_eq!(outcomes[0].result.as_ref().unwrap().data.symbol, "AAPL");
        assert_eq!(
            outcomes[1].result,
            Err(ResolverError::NoDataAvailable("ZZZ".to_string()))
        );
        assert!(matches!(outcomes[2].result, Err(ResolverError::Validation(_))));
        assert_eq!(outcomes[3].result.as_ref().unwrap().data.symbol, "MSFT");
    }

    // =========================================================================
    // resolve_historical_series
    // =========================================================================

    #[tokio::test]
    async fn test_legacy_rows_trigger_single_backfill_and_requery() {
        let h = harness();
        h.prices.add(legacy_row("AAPL", d(2024, 3, 4), dec!(10)));
        h.prices.add(legacy_row("AAPL", d(2024, 3, 5), dec!(11)));
        h.provider.bars_return(Ok(vec![
            daily_bar(d(2024, 3, 4), dec!(10)),
            daily_bar(d(2024, 3, 5), dec!(11)),
        ]));

        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();

        assert_eq!(
            h.provider.bar_calls(),
            vec![(d(2024, 3, 4), d(2024, 3, 5), BarResolution::Daily)]
        );
        assert_eq!(
            h.prices.range_calls(),
            vec![(d(2024, 3, 4), d(2024, 3, 5)), (d(2024, 3, 4), d(2024, 3, 5))]
        );
        assert_eq!(series.rows.len(), 2);
        assert!(series.rows.iter().all(PriceRow::has_complete_ohlc));
    }

    #[tokio::test]
    async fn test_single_day_window() {
        let h = harness();
        h.provider
            .bars_return(Ok(vec![daily_bar(d(2024, 3, 4), dec!(42))]));

        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 4), d(2024, 3, 4)))
            .await
            .unwrap();

        assert_eq!((series.from, series.to), (d(2024, 3, 4), d(2024, 3, 4)));
        assert_eq!(
            h.provider.bar_calls(),
            vec![(d(2024, 3, 4), d(2024, 3, 4), BarResolution::Daily)]
        );
        assert_eq!(series.rows.len(), 1);
        assert_eq!(series.rows[0].price, dec!(42));
    }

    #[tokio::test]
    async fn test_empty_backfill_is_empty_series() {
        let h = harness();
        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::last_days(10))
            .await
            .unwrap();

        assert!(series.rows.is_empty());
        assert_eq!(series.to, d(2024, 3, 6));
        assert_eq!(series.from, d(2024, 2, 25));
        assert_eq!(h.provider.bar_calls().len(), 1);
        assert_eq!(h.prices.range_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_backfill_returns_current_rows() {
        let h = harness();
        h.prices.add(legacy_row("AAPL", d(2024, 3, 4), dec!(10)));
        h.provider.bars_return(Err(timeout()));

        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 4), d(2024, 3, 5)))
            .await
            .unwrap();

        assert_eq!(series.rows, vec![legacy_row("AAPL", d(2024, 3, 4), dec!(10))]);
        assert_eq!(h.prices.range_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unpersisted_backfill_returns_fetched_rows() {
        let h = harness();
        h.prices.fail_upserts.store(true, Ordering::SeqCst);
        h.provider
            .bars_return(Ok(vec![daily_bar(d(2024, 3, 4), dec!(10))]));

        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 4), d(2024, 3, 4)))
            .await
            .unwrap();

        assert_eq!(series.rows, vec![complete_row("AAPL", d(2024, 3, 4), dec!(10))]);
        assert_eq!(h.prices.range_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_simulation_skips_backfill() {
        let h = build(true, None, start_time());
        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::last_days(5))
            .await
            .unwrap();
        assert!(series.rows.is_empty());
        assert!(h.provider.bar_calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_validation() {
        let h = harness();
        let err = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 5), d(2024, 3, 4)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Validation(ValidationError::InvalidDateRange { .. })
        ));

        let err = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::last_days(4000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Validation(ValidationError::DaysOutOfRange { .. })
        ));
        assert!(h.prices.range_calls().is_empty());
    }

    #[tokio::test]
    async fn test_gap_top_up_goes_to_background_sink() {
        let sink = Arc::new(RecordingTasks::default());
        let h = build(false, Some(sink.clone()), start_time());
        h.prices.add(complete_row("AAPL", d(2024, 3, 1), dec!(10)));
        h.prices.add(complete_row("AAPL", d(2024, 3, 4), dec!(11)));
        h.provider.bars_return(Ok(vec![
            daily_bar(d(2024, 3, 5), dec!(12)),
            daily_bar(d(2024, 3, 6), dec!(13)),
        ]));

        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 1), d(2024, 3, 6)))
            .await
            .unwrap();

        assert_eq!(series.rows.len(), 2);
        assert!(h.provider.bar_calls().is_empty());
        assert_eq!(sink.pending(), 1);

        sink.run_all().await;
        assert_eq!(
            h.provider.bar_calls(),
            vec![(d(2024, 3, 5), d(2024, 3, 6), BarResolution::Daily)]
        );
        assert_eq!(h.prices.rows.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_gap_top_up_inline_without_sink() {
        let h = harness();
        h.prices.add(complete_row("AAPL", d(2024, 3, 4), dec!(11)));
        h.provider
            .bars_return(Ok(vec![daily_bar(d(2024, 3, 5), dec!(12))]));

        let series = h
            .resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 4), d(2024, 3, 6)))
            .await
            .unwrap();

        assert_eq!(series.rows.len(), 1);
        assert_eq!(h.provider.bar_calls().len(), 1);
        assert_eq!(h.prices.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_top_up_for_weekend_or_future_gap() {
        // Sunday 2024-03-10; newest row is Friday.
        let sunday = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let h = build(false, None, sunday);
        h.prices.add(complete_row("AAPL", d(2024, 3, 8), dec!(11)));

        h.resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 8), d(2024, 3, 10)))
            .await
            .unwrap();
        assert!(h.provider.bar_calls().is_empty());

        h.resolver
            .resolve_historical_series("AAPL", HistoryQuery::between(d(2024, 3, 8), d(2024, 3, 12)))
            .await
            .unwrap();
        assert!(h.provider.bar_calls().is_empty());
    }

    // =========================================================================
    // resolve_intraday_series
    // =========================================================================

    fn half_hour_bars() -> Vec<RawBar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap();
        (0..6)
            .map(|i| {
                let px = Decimal::from(100 + i);
                RawBar::ohlcv(
                    start + Duration::minutes(30 * i),
                    px,
                    px + dec!(1),
                    px - dec!(1),
                    px + dec!(0.5),
                    dec!(10),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_intraday_uses_coarsest_dividing_resolution_and_caches() {
        let h = harness();
        h.provider.bars_return(Ok(half_hour_bars()));

        let resolved = h
            .resolver
            .resolve_intraday_series("AAPL", "90m", 2)
            .await
            .unwrap();

        assert!(!resolved.stale);
        assert_eq!(resolved.data.source_resolution, BarResolution::ThirtyMinutes);
        assert_eq!(
            h.provider.bar_calls(),
            vec![(d(2024, 3, 4), d(2024, 3, 6), BarResolution::ThirtyMinutes)]
        );

        let candles = &resolved.data.candles;
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, dec!(100));
        assert_eq!(candles[0].close, dec!(102.5));
        assert_eq!(candles[0].volume, dec!(30));
        assert_eq!(candles[1].open, dec!(103));

        h.resolver
            .resolve_intraday_series("AAPL", "90m", 2)
            .await
            .unwrap();
        assert_eq!(h.provider.bar_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_intraday_provider_failure_is_stale_and_empty() {
        let h = harness();
        h.provider.bars_return(Err(timeout()));

        let resolved = h
            .resolver
            .resolve_intraday_series("AAPL", "4h", 5)
            .await
            .unwrap();
        assert!(resolved.stale);
        assert_eq!(resolved.stale_reason, Some(StaleReason::ProviderNetworkError));
        assert!(resolved.data.candles.is_empty());
        assert_eq!(resolved.data.source_resolution, BarResolution::FourHours);
    }

    #[tokio::test]
    async fn test_intraday_rejected_provider_is_stale_api_error() {
        let h = harness();
        h.provider.bars_return(Err(MarketDataError::ProviderError {
            provider: "MOCK".to_string(),
            message: "Invalid API KEY.".to_string(),
        }));

        let resolved = h
            .resolver
            .resolve_intraday_series("AAPL", "4h", 5)
            .await
            .unwrap();
        assert!(resolved.stale);
        assert_eq!(resolved.stale_reason, Some(StaleReason::ProviderApiError));
        assert!(resolved.data.candles.is_empty());
    }

    #[tokio::test]
    async fn test_intraday_empty_bars_are_not_cached() {
        let h = harness();
        h.provider.bars_return(Ok(Vec::new()));

        let first = h
            .resolver
            .resolve_intraday_series("AAPL", "4h", 5)
            .await
            .unwrap();
        assert!(first.data.candles.is_empty());

        h.provider.bars_return(Ok(half_hour_bars()));
        let second = h
            .resolver
            .resolve_intraday_series("AAPL", "4h", 5)
            .await
            .unwrap();
        assert!(!second.stale);
        assert!(!second.data.candles.is_empty());
        assert_eq!(h.provider.bar_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_intraday_validation() {
        let h = harness();
        let err = h
            .resolver
            .resolve_intraday_series("AAPL", "4d", 5)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResolverError::Validation(ValidationError::InvalidInterval("4d".to_string()))
        );

        let err = h
            .resolver
            .resolve_intraday_series("AAPL", "4h", 31)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Validation(ValidationError::DaysOutOfRange { days: 31, .. })
        ));
        assert!(h.provider.bar_calls().is_empty());
    }

    // =========================================================================
    // resolve_daily_rollup
    // =========================================================================

    #[tokio::test]
    async fn test_daily_rollup_from_hourly_bars() {
        let h = harness();
        let bar = |day: u32, hour: u32, close: Decimal| {
            let ts = Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap();
            RawBar::ohlcv(ts, close, close, close, close, dec!(1))
        };
        h.provider.bars_return(Ok(vec![
            bar(4, 14, dec!(10)),
            bar(4, 15, dec!(12)),
            bar(5, 14, dec!(13)),
        ]));

        let resolved = h
            .resolver
            .resolve_daily_rollup("AAPL", d(2024, 3, 4), d(2024, 3, 5))
            .await
            .unwrap();

        assert!(!resolved.stale);
        assert_eq!(resolved.data.len(), 2);
        assert_eq!(resolved.data[0].open, dec!(10));
        assert_eq!(resolved.data[0].close, dec!(12));
        assert_eq!(resolved.data[0].volume, dec!(2));
        assert_eq!(
            h.provider.bar_calls(),
            vec![(d(2024, 3, 4), d(2024, 3, 5), BarResolution::OneHour)]
        );
    }

    #[tokio::test]
    async fn test_daily_rollup_empty_bars_are_not_cached() {
        let h = harness();
        h.provider.bars_return(Ok(Vec::new()));

        for _ in 0..2 {
            let resolved = h
                .resolver
                .resolve_daily_rollup("AAPL", d(2024, 3, 4), d(2024, 3, 5))
                .await
                .unwrap();
            assert!(resolved.data.is_empty());
        }
        assert_eq!(h.provider.bar_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_daily_rollup_falls_back_to_stored_rows() {
        let h = harness();
        h.prices.add(legacy_row("AAPL", d(2024, 3, 4), dec!(10)));
        h.provider.bars_return(Err(timeout()));

        let resolved = h
            .resolver
            .resolve_daily_rollup("AAPL", d(2024, 3, 4), d(2024, 3, 5))
            .await
            .unwrap();

        assert!(resolved.stale);
        assert_eq!(resolved.stale_reason, Some(StaleReason::ProviderNetworkError));
        assert_eq!(resolved.data.len(), 1);
        assert_eq!(resolved.data[0].open, dec!(10));
        assert_eq!(resolved.data[0].high, dec!(10));
    }

    // =========================================================================
    // resolve_profile
    // =========================================================================

    #[tokio::test]
    async fn test_profile_is_cached() {
        let h = harness();
        h.provider.profile_returns(Ok(AssetProfile {
            name: Some("Apple Inc.".to_string()),
            ..AssetProfile::for_symbol("AAPL")
        }));

        let first = h.resolver.resolve_profile("aapl").await.unwrap();
        assert_eq!(first.data.name.as_deref(), Some("Apple Inc."));
        h.resolver.resolve_profile("AAPL").await.unwrap();
        assert_eq!(h.provider.profile_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_profile_failure_is_bare_and_stale() {
        let h = harness();
        h.provider.profile_returns(Err(MarketDataError::HttpStatus {
            provider: "MOCK".to_string(),
            status: 403,
        }));

        let resolved = h.resolver.resolve_profile("AAPL").await.unwrap();
        assert!(resolved.stale);
        assert_eq!(resolved.stale_reason, Some(StaleReason::ProviderApiError));
        assert_eq!(resolved.data, AssetProfile::for_symbol("AAPL"));
    }

    #[test]
    fn test_clock_is_shared_with_harness() {
        let h = harness();
        assert_eq!(h.clock.today(), d(2024, 3, 6));
    }
}
