use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use super::notation::NoteDuration;
use super::{PitchDegree, RhythmToken, parse_rhythm};
use crate::error::{Error, Result};

fn default_weight() -> u32 {
    1
}

fn default_tonic() -> u8 {
    60
}

/// How a rhythm pattern is authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternBody {
    /// Symbolic durations, e.g. `"q e e qr q"`.
    Notation(String),
    /// Onsets in reference units (1000 = one quarter note).
    Offsets(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmPattern {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(flatten)]
    pub body: PatternBody,
}

impl RhythmPattern {
    pub fn notation(name: &str, notation: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: 1,
            body: PatternBody::Notation(notation.to_string()),
        }
    }

    pub fn offsets(name: &str, offsets: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            weight: 1,
            body: PatternBody::Offsets(offsets),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    /// Semitones above the tonic for degrees 1..=7.
    pub fn intervals(&self) -> [u8; 7] {
        match self {
            Self::Major => [0, 2, 4, 5, 7, 9, 11],
            Self::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melody {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Space-separated notes, e.g. `"do re mi:h sol' -:q do"`.
    pub notes: String,
    #[serde(default = "default_tonic")]
    pub tonic_midi: u8,
    #[serde(default)]
    pub mode: Mode,
}

impl Melody {
    pub fn new(name: &str, notes: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: 1,
            notes: notes.to_string(),
            tonic_midi: default_tonic(),
            mode: Mode::default(),
        }
    }
}

/// One parsed melody token. `pitch` is `None` for rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MelodyNote {
    pub pitch: Option<PitchDegree>,
    pub duration: NoteDuration,
}

impl MelodyNote {
    pub fn as_rhythm(&self) -> RhythmToken {
        RhythmToken {
            duration: self.duration,
            rest: self.pitch.is_none(),
        }
    }
}

fn syllable_degree(syllable: &str) -> Option<u8> {
    let degree = match syllable.to_ascii_lowercase().as_str() {
        "do" | "1" => 1,
        "re" | "2" => 2,
        "mi" | "3" => 3,
        "fa" | "4" => 4,
        "sol" | "so" | "5" => 5,
        "la" | "6" => 6,
        "ti" | "si" | "7" => 7,
        _ => return None,
    };
    Some(degree)
}

/// Parse a melody into degrees resolved against its tonic and mode.
///
/// Each token is `<syllable|digit>[' or ,]*[:duration]`; `-` or `r` is a rest.
pub fn parse_melody(melody: &Melody) -> Result<Vec<MelodyNote>> {
    let intervals = melody.mode.intervals();

    melody
        .notes
        .split_whitespace()
        .map(|token| {
            let (head, duration) = match token.split_once(':') {
                Some((head, d)) => (head, d.parse::<NoteDuration>()?),
                None => (token, NoteDuration::QUARTER),
            };

            if head == "-" || head == "r" {
                return Ok(MelodyNote {
                    pitch: None,
                    duration,
                });
            }

            let name = head.trim_end_matches(['\'', ',']);
            let marks = &head[name.len()..];
            let octave = marks
                .chars()
                .try_fold(0i8, |acc, c| match c {
                    '\'' => acc.checked_add(1),
                    _ => acc.checked_sub(1),
                })
                .ok_or_else(|| Error::Notation(format!("too many octave marks in '{}'", token)))?;

            let degree = syllable_degree(name)
                .ok_or_else(|| Error::Notation(format!("unknown melody token '{}'", token)))?;

            let midi = melody.tonic_midi as i32
                + intervals[(degree - 1) as usize] as i32
                + 12 * octave as i32;
            let midi = u8::try_from(midi)
                .ok()
                .filter(|m| *m <= 127)
                .ok_or_else(|| Error::Notation(format!("'{}' is outside the MIDI range", token)))?;

            Ok(MelodyNote {
                pitch: Some(PitchDegree {
                    degree,
                    octave,
                    midi,
                }),
                duration,
            })
        })
        .collect()
}

/// Parse rhythm notation of a pattern, for patterns authored symbolically.
pub fn pattern_tokens(pattern: &RhythmPattern) -> Result<Option<Vec<RhythmToken>>> {
    match &pattern.body {
        PatternBody::Notation(n) => parse_rhythm(n).map(Some),
        PatternBody::Offsets(_) => Ok(None),
    }
}
