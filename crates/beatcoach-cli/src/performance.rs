//! Scripted performances replayed by `simulate`.
//!
//! All times are milliseconds after listening opens, excluding paused time.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Performance {
    #[serde(default = "default_user")]
    pub user_id: String,
    /// Simulate a capture device that cannot be acquired.
    #[serde(default)]
    pub device_unavailable: bool,
    #[serde(default)]
    pub rounds: Vec<RoundScript>,
}

fn default_user() -> String {
    "local".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PitchSample {
    pub at_ms: u64,
    pub frequency_hz: f32,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PauseScript {
    pub at_ms: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoundScript {
    #[serde(default)]
    pub taps: Vec<u64>,
    #[serde(default)]
    pub pitches: Vec<PitchSample>,
    #[serde(default)]
    pub pause: Option<PauseScript>,
    /// Manual submission time; requires `allow_manual_submit`.
    #[serde(default)]
    pub submit_at_ms: Option<u64>,
}

/// One input due at a listen-relative time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedInput {
    Tap,
    Pitch { frequency_hz: f32, confidence: f32 },
}

impl RoundScript {
    /// Inputs in the order they occur.
    pub fn timeline(&self) -> VecDeque<(u64, ScriptedInput)> {
        let mut inputs: Vec<(u64, ScriptedInput)> = self
            .taps
            .iter()
            .map(|&at| (at, ScriptedInput::Tap))
            .chain(self.pitches.iter().map(|p| {
                (
                    p.at_ms,
                    ScriptedInput::Pitch {
                        frequency_hz: p.frequency_hz,
                        confidence: p.confidence,
                    },
                )
            }))
            .collect();
        inputs.sort_by_key(|(at, _)| *at);
        inputs.into()
    }
}

impl Performance {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read performance from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse performance {}", path.display()))
    }

    pub fn round(&self, index: usize) -> RoundScript {
        self.rounds.get(index).cloned().unwrap_or_default()
    }
}
