//! Periodic quote polling for the `watch` command.

use std::time::Duration;

use tickerline_core::Resolver;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Never poll faster than this, whatever the configured interval.
const MIN_POLL: Duration = Duration::from_secs(1);

/// Resolve `symbols` every `every` and print one JSON line per round.
/// Runs until interrupted, or for `rounds` rounds when given.
pub async fn watch_quotes(
    resolver: &Resolver,
    symbols: &[String],
    every: Duration,
    rounds: Option<u32>,
) -> anyhow::Result<()> {
    let every = every.max(MIN_POLL);
    info!("Watching {} symbols every {:?}", symbols.len(), every);

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completed = 0u32;
    loop {
        ticker.tick().await;
        let outcomes = resolver.resolve_quotes_batch(symbols).await;

        let stale = outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(r) if r.stale))
            .count();
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        debug!("Round {}: {} stale, {} failed", completed + 1, stale, failed);

        println!("{}", serde_json::to_string(&outcomes)?);

        completed += 1;
        if rounds.is_some_and(|max| completed >= max) {
            return Ok(());
        }
    }
}
