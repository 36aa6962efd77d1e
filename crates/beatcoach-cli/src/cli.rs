//! CLI argument definitions for beatcoach.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beatcoach")]
#[command(about = "Rhythm and pitch performance evaluation engine", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build and print the timelines a level would play
    Timeline {
        /// Level configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        level: PathBuf,
        /// Engine configuration (JSON); defaults are used when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Fixed selection seed
        #[arg(long, conflicts_with = "daily")]
        seed: Option<u64>,
        /// Daily variant for the given date (YYYY-MM-DD)
        #[arg(long)]
        daily: Option<NaiveDate>,
        /// Number of rounds to build (default: the level's round count)
        #[arg(long)]
        rounds: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a scripted performance through the engine
    Simulate {
        /// Level configuration (JSON)
        #[arg(short, long, value_name = "FILE")]
        level: PathBuf,
        /// Performance script (JSON)
        #[arg(short, long, value_name = "FILE")]
        performance: PathBuf,
        /// Engine configuration (JSON); defaults are used when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Fixed selection seed (default: 0)
        #[arg(long)]
        seed: Option<u64>,
        /// Show the per-event breakdown of each round
        #[arg(long)]
        events: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Session API endpoint URL
        #[arg(long, env = "BEATCOACH_API_ENDPOINT")]
        api_endpoint: Option<String>,
        /// Session API token
        #[arg(long, env = "BEATCOACH_API_TOKEN")]
        api_token: Option<String>,
    },
    /// Print the default engine configuration
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}
