use serde::{Deserialize, Serialize};

use crate::config::{PitchWindows, TimingWindows};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A scale degree resolved to an absolute MIDI note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PitchDegree {
    /// 1..=7
    pub degree: u8,
    /// Octave shift relative to the tonic.
    pub octave: i8,
    pub midi: u8,
}

impl PitchDegree {
    pub fn frequency_hz(&self) -> f64 {
        midi_to_hz(self.midi as f64)
    }
}

/// What the player has to reproduce for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ExpectedValue {
    /// Index of the sounding beat within the pattern.
    Beat(u32),
    Pitch(PitchDegree),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tolerance {
    Timing(TimingWindows),
    Pitch(PitchWindows),
}

/// A single scheduled beat or note. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedEvent {
    pub id: EventId,
    pub time_offset_ms: u64,
    pub value: ExpectedValue,
    pub tolerance: Tolerance,
}

pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2f64.powf((midi - 69.0) / 12.0)
}

/// Fractional MIDI note number for a frequency. Non-positive input yields `None`.
pub fn hz_to_midi(frequency_hz: f64) -> Option<f64> {
    if frequency_hz > 0.0 && frequency_hz.is_finite() {
        Some(69.0 + 12.0 * (frequency_hz / 440.0).log2())
    } else {
        None
    }
}
