use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tickerline_core::{Resolver, ResolverConfig, TokioBackgroundTasks};
use tickerline_market_data::{FmpProvider, ProviderSettings, RetryPolicy, WikipediaSummaryClient};
use tickerline_storage_sqlite::{self as storage, MarketDataRepository};

use crate::args::{history_query, Command};
use crate::watch::watch_quotes;

pub fn init_tracing() {
    let log_format =
        std::env::var("TICKERLINE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the JSON results.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn provider_settings(config: &ResolverConfig) -> ProviderSettings {
    ProviderSettings {
        api_key: config.provider.api_key.clone(),
        base_url: config.provider.base_url.clone(),
        timeout: config.provider.timeout,
        retry: RetryPolicy::new(config.provider.max_attempts, config.provider.base_delay),
    }
}

/// Wire storage, provider and resolver. Long-running commands hand gap
/// top-ups to the tokio runtime; one-shot commands await them.
pub fn build_resolver(config: &ResolverConfig, background: bool) -> anyhow::Result<Resolver> {
    let (pool, writer) = storage::open(&config.db_path)?;
    info!("Opened database at {}", config.db_path);
    let repository = Arc::new(MarketDataRepository::new(pool, writer));

    let descriptions = Arc::new(WikipediaSummaryClient::new(config.provider.timeout));
    let provider =
        Arc::new(FmpProvider::new(provider_settings(config)).with_description_source(descriptions));

    let builder = Resolver::builder(config.clone(), provider, repository.clone(), repository);
    let builder = if background {
        builder.background_tasks(Arc::new(TokioBackgroundTasks))
    } else {
        builder
    };
    Ok(builder.build())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run(command: Command, resolver: &Resolver, config: &ResolverConfig) -> anyhow::Result<()> {
    match command {
        Command::Quote { symbols } => print_json(&resolver.resolve_quotes_batch(&symbols).await),
        Command::History {
            symbol,
            from,
            to,
            days,
        } => print_json(
            &resolver
                .resolve_historical_series(&symbol, history_query(from, to, days))
                .await?,
        ),
        Command::Intraday {
            symbol,
            interval,
            days,
        } => print_json(
            &resolver
                .resolve_intraday_series(&symbol, &interval, days)
                .await?,
        ),
        Command::Rollup { symbol, from, to } => {
            print_json(&resolver.resolve_daily_rollup(&symbol, from, to).await?)
        }
        Command::Profile { symbol } => print_json(&resolver.resolve_profile(&symbol).await?),
        Command::Watch { symbols, rounds } => {
            watch_quotes(resolver, &symbols, config.polling_interval, rounds).await
        }
    }
}
