//! Timeline command: show what a level would play.

use std::path::Path;

use anyhow::Result;
use beatcoach_core::export::{format_timeline, to_json};
use beatcoach_core::{SelectionSeed, TimelineBuilder};
use chrono::NaiveDate;

use super::{load_engine_config, load_level};

pub fn selection_seed(seed: Option<u64>, daily: Option<NaiveDate>) -> SelectionSeed {
    match (seed, daily) {
        (Some(seed), _) => SelectionSeed::Fixed(seed),
        (None, Some(date)) => SelectionSeed::Daily(date),
        (None, None) => SelectionSeed::Random,
    }
}

pub fn run(
    level_path: &Path,
    config_path: Option<&Path>,
    seed: Option<u64>,
    daily: Option<NaiveDate>,
    rounds: Option<u32>,
    json: bool,
) -> Result<()> {
    let config = load_engine_config(config_path)?;
    let level = load_level(level_path)?;
    let count = rounds.unwrap_or(level.rounds);
    let profile = config.profile_for(level.difficulty).clone();

    let mut builder = TimelineBuilder::new(level, profile, selection_seed(seed, daily))?;
    let timelines = (0..count)
        .map(|_| builder.next_round())
        .collect::<beatcoach_core::Result<Vec<_>>>()?;

    if json {
        println!("{}", to_json(&timelines)?);
    } else {
        for (index, timeline) in timelines.iter().enumerate() {
            println!("Round {}: {}", index + 1, format_timeline(timeline));
        }
    }
    Ok(())
}
