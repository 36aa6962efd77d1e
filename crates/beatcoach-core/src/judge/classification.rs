use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::timeline::EventId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
pub enum Classification {
    #[strum(serialize = "PERFECT")]
    Perfect,
    #[strum(serialize = "GOOD")]
    Good,
    #[strum(serialize = "MISS")]
    Miss,
    #[strum(serialize = "EXTRA")]
    ExtraInput,
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Perfect | Self::Good)
    }

    pub fn short_name(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Deviation of a matched capture from its expected event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchError {
    /// Captured minus expected; negative is early.
    Ms(i64),
    /// Captured minus expected; negative is flat.
    Cents(f32),
}

/// Early/late feedback for a timed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
pub enum Timing {
    Early,
    OnTime,
    Late,
}

impl Timing {
    pub fn from_error_ms(error_ms: i64) -> Self {
        match error_ms {
            e if e < 0 => Self::Early,
            0 => Self::OnTime,
            _ => Self::Late,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub expected_id: Option<EventId>,
    pub expected_offset_ms: Option<u64>,
    pub captured_timestamp_ms: Option<u64>,
    pub classification: Classification,
    pub error: Option<MatchError>,
}

impl MatchResult {
    pub fn miss(id: EventId, offset_ms: u64) -> Self {
        Self {
            expected_id: Some(id),
            expected_offset_ms: Some(offset_ms),
            captured_timestamp_ms: None,
            classification: Classification::Miss,
            error: None,
        }
    }

    pub fn extra(timestamp_ms: u64) -> Self {
        Self {
            expected_id: None,
            expected_offset_ms: None,
            captured_timestamp_ms: Some(timestamp_ms),
            classification: Classification::ExtraInput,
            error: None,
        }
    }

    /// Position on the round timeline used to order outcomes.
    pub fn time_key(&self) -> u64 {
        self.expected_offset_ms
            .or(self.captured_timestamp_ms)
            .unwrap_or(0)
    }

    /// Capture timing relative to the expected offset, for successful matches.
    pub fn timing(&self) -> Option<Timing> {
        match (self.expected_offset_ms, self.captured_timestamp_ms) {
            (Some(expected), Some(captured)) if self.classification.is_success() => {
                Some(Timing::from_error_ms(captured as i64 - expected as i64))
            }
            _ => None,
        }
    }
}
