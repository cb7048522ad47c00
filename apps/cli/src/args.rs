//! Command line definition for the `tickerline` binary.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tickerline_core::HistoryQuery;

pub const DEFAULT_INTRADAY_DAYS: i64 = 5;

#[derive(Parser, Debug)]
#[command(
    name = "tickerline",
    version,
    about = "Resolve quotes, price history and candles from cache, store or provider",
    after_help = "Configuration is read from TICKERLINE_* environment variables (and .env).",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Resolve the latest quote for one or more symbols.
    Quote {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Stored daily prices, backfilled from the provider when needed.
    History {
        symbol: String,

        /// First day (YYYY-MM-DD). Defaults to `--to` minus `--days`.
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Window length when `--from` is not given.
        #[arg(long)]
        days: Option<i64>,
    },
    /// Intraday candles at an interval such as `30m` or `4h`.
    Intraday {
        symbol: String,
        interval: String,

        #[arg(long, default_value_t = DEFAULT_INTRADAY_DAYS)]
        days: i64,
    },
    /// Calendar-day candles rolled up from hourly bars.
    Rollup {
        symbol: String,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        to: NaiveDate,
    },
    /// Asset profile with description.
    Profile { symbol: String },
    /// Re-resolve quotes every polling interval, one JSON line per round.
    Watch {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Stop after this many rounds. Runs until interrupted when unset.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        rounds: Option<u32>,
    },
}

impl Command {
    /// Gap top-ups are handed to the runtime only for long-running commands.
    pub fn is_long_running(&self) -> bool {
        matches!(self, Command::Watch { .. })
    }
}

pub fn history_query(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    days: Option<i64>,
) -> HistoryQuery {
    HistoryQuery { from, to, days }
}
