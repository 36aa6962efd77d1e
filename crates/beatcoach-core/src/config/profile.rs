use serde::{Deserialize, Serialize};

/// Millisecond tolerance bands for rhythm events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingWindows {
    pub perfect_ms: u32,
    pub good_ms: u32,
    /// Latest a capture may land after the expected offset and still be considered.
    pub lookahead_ms: u32,
}

impl TimingWindows {
    pub const fn new(perfect_ms: u32, good_ms: u32, lookahead_ms: u32) -> Self {
        Self {
            perfect_ms,
            good_ms,
            lookahead_ms,
        }
    }
}

impl Default for TimingWindows {
    fn default() -> Self {
        Self::new(75, 150, 150)
    }
}

/// Cent tolerance bands for pitch events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchWindows {
    pub perfect_cents: f32,
    pub good_cents: f32,
    /// A sung note must land within this many ms of the expected offset, either side.
    pub lookahead_ms: u32,
}

impl Default for PitchWindows {
    fn default() -> Self {
        Self {
            perfect_cents: 25.0,
            good_cents: 50.0,
            lookahead_ms: 600,
        }
    }
}

/// Point values used by the scoring fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub perfect_points: u32,
    pub good_points: u32,
    pub miss_penalty: u32,
    pub extra_penalty: u32,
    pub per_combo_increment: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            perfect_points: 100,
            good_points: 50,
            miss_penalty: 20,
            extra_penalty: 10,
            per_combo_increment: 5,
        }
    }
}

/// Everything that varies with a level's difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub name: String,
    pub timing: TimingWindows,
    pub pitch: PitchWindows,
    pub scoring: ScoringRules,
    /// Fraction of expected events that must be Perfect or Good for the round to count as passed.
    pub success_threshold: f64,
}

impl DifficultyProfile {
    pub fn easy() -> Self {
        Self {
            name: "easy".to_string(),
            timing: TimingWindows::new(90, 180, 180),
            pitch: PitchWindows {
                perfect_cents: 30.0,
                good_cents: 60.0,
                lookahead_ms: 800,
            },
            scoring: ScoringRules::default(),
            success_threshold: 0.6,
        }
    }

    pub fn normal() -> Self {
        Self {
            name: "normal".to_string(),
            timing: TimingWindows::default(),
            pitch: PitchWindows::default(),
            scoring: ScoringRules::default(),
            success_threshold: 0.7,
        }
    }

    pub fn hard() -> Self {
        Self {
            name: "hard".to_string(),
            timing: TimingWindows::new(50, 100, 100),
            pitch: PitchWindows {
                perfect_cents: 20.0,
                good_cents: 40.0,
                lookahead_ms: 400,
            },
            scoring: ScoringRules {
                perfect_points: 120,
                good_points: 60,
                ..ScoringRules::default()
            },
            success_threshold: 0.75,
        }
    }

    /// Check band ordering and threshold range.
    pub fn validate(&self) -> Result<(), String> {
        if self.timing.perfect_ms > self.timing.good_ms {
            return Err(format!(
                "{}: perfect window {}ms wider than good window {}ms",
                self.name, self.timing.perfect_ms, self.timing.good_ms
            ));
        }
        if self.pitch.perfect_cents > self.pitch.good_cents {
            return Err(format!(
                "{}: perfect pitch band {} wider than good band {}",
                self.name, self.pitch.perfect_cents, self.pitch.good_cents
            ));
        }
        if !(0.0..=1.0).contains(&self.success_threshold) {
            return Err(format!(
                "{}: success threshold {} outside 0..=1",
                self.name, self.success_threshold
            ));
        }
        if self.scoring.good_points == 0 || self.scoring.perfect_points <= self.scoring.good_points
        {
            return Err(format!(
                "{}: perfect points must exceed good points, which must be positive",
                self.name
            ));
        }
        Ok(())
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self::normal()
    }
}
