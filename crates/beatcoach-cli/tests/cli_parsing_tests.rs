//! CLI argument parsing tests.
//!
//! These tests verify that command-line arguments are parsed correctly
//! without actually executing the commands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

// Re-create Args structure for testing since it's not publicly exported
#[derive(Parser)]
#[command(name = "beatcoach")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    Timeline {
        #[arg(short, long, value_name = "FILE")]
        level: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, conflicts_with = "daily")]
        seed: Option<u64>,
        #[arg(long)]
        daily: Option<NaiveDate>,
        #[arg(long)]
        rounds: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    Simulate {
        #[arg(short, long, value_name = "FILE")]
        level: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        performance: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        events: bool,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        api_endpoint: Option<String>,
        #[arg(long)]
        api_token: Option<String>,
    },
    Config {
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[test]
fn test_parse_requires_subcommand() {
    assert!(Args::try_parse_from(["beatcoach"]).is_err());
}

#[test]
fn test_parse_timeline_defaults() {
    let args = Args::try_parse_from(["beatcoach", "timeline", "--level", "level.json"]).unwrap();
    match args.command {
        Command::Timeline {
            level,
            config,
            seed,
            daily,
            rounds,
            json,
        } => {
            assert_eq!(level, PathBuf::from("level.json"));
            assert!(config.is_none());
            assert!(seed.is_none());
            assert!(daily.is_none());
            assert!(rounds.is_none());
            assert!(!json);
        }
        _ => panic!("Expected Timeline command"),
    }
}

#[test]
fn test_parse_timeline_daily() {
    let args = Args::try_parse_from([
        "beatcoach",
        "timeline",
        "-l",
        "level.json",
        "--daily",
        "2024-03-09",
        "--json",
    ])
    .unwrap();
    match args.command {
        Command::Timeline { daily, json, .. } => {
            assert_eq!(daily, NaiveDate::from_ymd_opt(2024, 3, 9));
            assert!(json);
        }
        _ => panic!("Expected Timeline command"),
    }
}

#[test]
fn test_parse_timeline_seed_conflicts_with_daily() {
    let result = Args::try_parse_from([
        "beatcoach",
        "timeline",
        "--level",
        "level.json",
        "--seed",
        "7",
        "--daily",
        "2024-03-09",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_timeline_invalid_date() {
    let result = Args::try_parse_from([
        "beatcoach",
        "timeline",
        "--level",
        "level.json",
        "--daily",
        "09/03/2024",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_simulate() {
    let args = Args::try_parse_from([
        "beatcoach",
        "simulate",
        "--level",
        "level.json",
        "--performance",
        "take1.json",
        "--seed",
        "3",
        "--events",
    ])
    .unwrap();
    match args.command {
        Command::Simulate {
            level,
            performance,
            config,
            seed,
            events,
            json,
            api_endpoint,
            api_token,
        } => {
            assert_eq!(level, PathBuf::from("level.json"));
            assert_eq!(performance, PathBuf::from("take1.json"));
            assert!(config.is_none());
            assert_eq!(seed, Some(3));
            assert!(events);
            assert!(!json);
            assert!(api_endpoint.is_none());
            assert!(api_token.is_none());
        }
        _ => panic!("Expected Simulate command"),
    }
}

#[test]
fn test_parse_simulate_requires_performance() {
    let result = Args::try_parse_from(["beatcoach", "simulate", "--level", "level.json"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_config_output() {
    let args = Args::try_parse_from(["beatcoach", "config", "-o", "engine.json"]).unwrap();
    match args.command {
        Command::Config { output } => assert_eq!(output, Some(PathBuf::from("engine.json"))),
        _ => panic!("Expected Config command"),
    }
}
