//! Export formats for round results, sessions and timelines.

mod console;

pub use console::*;

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::timeline::{ExpectedValue, Timeline};

/// Pretty JSON for any exported value.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Plain listing of a timeline's events.
pub fn format_timeline(timeline: &Timeline) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} ({} bpm, {} events)",
        timeline.source,
        timeline.tempo_bpm,
        timeline.len()
    );
    for event in &timeline.events {
        let value = match event.value {
            ExpectedValue::Beat(index) => format!("beat {}", index),
            ExpectedValue::Pitch(pitch) => format!(
                "degree {} octave {:+} (midi {}, {:.1} Hz)",
                pitch.degree,
                pitch.octave,
                pitch.midi,
                pitch.frequency_hz()
            ),
        };
        let _ = writeln!(output, "  {:>3} {:>6} ms  {}", event.id, event.time_offset_ms, value);
    }
    output
}
