mod cli;
mod commands;
mod performance;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG overrides; warnings only by default
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("beatcoach_cli=warn,beatcoach_core=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match args.command {
        Command::Timeline {
            level,
            config,
            seed,
            daily,
            rounds,
            json,
        } => commands::timeline::run(&level, config.as_deref(), seed, daily, rounds, json),
        Command::Simulate {
            level,
            performance,
            config,
            seed,
            events,
            json,
            api_endpoint,
            api_token,
        } => commands::simulate::run(commands::simulate::SimulateOptions {
            level: &level,
            performance: &performance,
            config: config.as_deref(),
            seed,
            show_events: events,
            json,
            api_endpoint: api_endpoint.as_deref(),
            api_token: api_token.as_deref(),
        }),
        Command::Config { output } => commands::config::run(output.as_deref()),
    }
}
