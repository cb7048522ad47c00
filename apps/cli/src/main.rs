mod args;
mod main_lib;
mod watch;

use args::Cli;
use clap::Parser;
use main_lib::{build_resolver, init_tracing, run};
use tickerline_core::ResolverConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = ResolverConfig::from_env()?;
    let resolver = build_resolver(&config, cli.command.is_long_running())?;
    run(cli.command, &resolver, &config).await
}
