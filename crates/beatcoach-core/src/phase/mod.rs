//! Round phase state machine.
//!
//! - `Phase` - Idle, Countdown, Playing, Listening, Evaluating, Result, Completed, Paused
//! - `RoundState` - the live round, owned by `RoundEngine`
//! - `RoundEngine` - timers, devices and transitions, driven by `tick()`
//! - `EngineEvent` - observation stream (`RoundEngine::subscribe`)

mod engine;
mod events;

pub use engine::*;
pub use events::*;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::capture::CapturedEvent;
use crate::judge::MatchResult;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, IntoStaticStr)]
pub enum Phase {
    #[default]
    Idle,
    Countdown,
    Playing,
    Listening,
    Evaluating,
    Result,
    Completed,
    Paused,
}

impl Phase {
    pub fn short_name(&self) -> &'static str {
        self.into()
    }

    /// Phases that can be suspended.
    pub fn is_pausable(&self) -> bool {
        matches!(self, Self::Countdown | Self::Playing | Self::Listening)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Why Listening ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
pub enum ListenExit {
    /// As many events captured as expected.
    AllCaptured,
    /// Listening deadline elapsed.
    Deadline,
    /// Manual submission.
    Submitted,
    /// The capture device could not be acquired.
    Degraded,
}

/// The live round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub round_index: u32,
    pub phase: Phase,
    pub timeline: Timeline,
    pub captured: Vec<CapturedEvent>,
    pub matches: Vec<MatchResult>,
    pub combo: u32,
    pub score: u32,
}

impl RoundState {
    pub fn new(round_index: u32, timeline: Timeline) -> Self {
        Self {
            round_index,
            phase: Phase::Countdown,
            timeline,
            captured: Vec::new(),
            matches: Vec::new(),
            combo: 0,
            score: 0,
        }
    }

    /// Drop captures and evaluation so the round can be replayed.
    pub fn reset_progress(&mut self) {
        self.captured.clear();
        self.matches.clear();
        self.combo = 0;
        self.score = 0;
    }

    pub fn all_captured(&self) -> bool {
        self.captured.len() >= self.timeline.len()
    }
}
