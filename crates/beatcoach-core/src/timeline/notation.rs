use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// Ticks per quarter note. Divisible by 3 so triplets stay exact.
pub const TICKS_PER_QUARTER: u64 = 960;

/// Authoring reference: one quarter note is written as 1000 ms.
pub const REFERENCE_UNIT_MS: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr)]
pub enum NoteValue {
    #[strum(serialize = "w")]
    Whole,
    #[strum(serialize = "h")]
    Half,
    #[strum(serialize = "q")]
    Quarter,
    #[strum(serialize = "e")]
    Eighth,
    #[strum(serialize = "s")]
    Sixteenth,
    /// Eighth-note triplet (a third of a quarter).
    #[strum(serialize = "t")]
    Triplet,
}

impl NoteValue {
    pub fn ticks(&self) -> u64 {
        match self {
            Self::Whole => TICKS_PER_QUARTER * 4,
            Self::Half => TICKS_PER_QUARTER * 2,
            Self::Quarter => TICKS_PER_QUARTER,
            Self::Eighth => TICKS_PER_QUARTER / 2,
            Self::Sixteenth => TICKS_PER_QUARTER / 4,
            Self::Triplet => TICKS_PER_QUARTER / 3,
        }
    }
}

/// A note value with optional dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteDuration {
    pub value: NoteValue,
    pub dotted: bool,
}

impl NoteDuration {
    pub const QUARTER: NoteDuration = NoteDuration {
        value: NoteValue::Quarter,
        dotted: false,
    };

    pub fn ticks(&self) -> u64 {
        let base = self.value.ticks();
        if self.dotted { base + base / 2 } else { base }
    }
}

impl FromStr for NoteDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (symbol, dotted) = match s.strip_suffix('.') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        let value = NoteValue::from_str(symbol)
            .map_err(|_| Error::Notation(format!("unknown duration '{}'", s)))?;
        Ok(Self { value, dotted })
    }
}

/// One token of rhythm notation: a sounding note or a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RhythmToken {
    pub duration: NoteDuration,
    pub rest: bool,
}

/// Parse whitespace-separated rhythm notation such as `"q e e q. s qr"`.
pub fn parse_rhythm(notation: &str) -> Result<Vec<RhythmToken>> {
    notation
        .split_whitespace()
        .map(|token| {
            let (body, rest) = match token.strip_suffix('r') {
                Some(body) => (body, true),
                None => (token, false),
            };
            let duration = body
                .parse::<NoteDuration>()
                .map_err(|_| Error::Notation(format!("unknown rhythm token '{}'", token)))?;
            Ok(RhythmToken { duration, rest })
        })
        .collect()
}

/// Onset ticks of every sounding note, in order.
pub fn onset_ticks(tokens: &[RhythmToken]) -> Vec<u64> {
    let mut position = 0;
    let mut onsets = Vec::new();
    for token in tokens {
        if !token.rest {
            onsets.push(position);
        }
        position += token.duration.ticks();
    }
    onsets
}

/// Convert a tick position to milliseconds at `tempo_bpm`, rounding to nearest.
pub fn ticks_to_ms(ticks: u64, tempo_bpm: u32) -> u64 {
    let denominator = TICKS_PER_QUARTER * tempo_bpm as u64;
    (ticks * 60_000 + denominator / 2) / denominator
}

/// Convert an offset authored in reference units (1000 per quarter) to milliseconds.
pub fn reference_to_ms(raw_offset: f64, beat_duration_ms: f64) -> u64 {
    (raw_offset * beat_duration_ms / REFERENCE_UNIT_MS).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_value_ticks() {
        assert_eq!(NoteValue::Whole.ticks(), 3840);
        assert_eq!(NoteValue::Quarter.ticks(), 960);
        assert_eq!(NoteValue::Sixteenth.ticks(), 240);
        assert_eq!(NoteValue::Triplet.ticks() * 3, NoteValue::Quarter.ticks());
    }

    #[test]
    fn test_dotted_duration() {
        let d: NoteDuration = "q.".parse().unwrap();
        assert!(d.dotted);
        assert_eq!(d.ticks(), 1440);
    }

    #[test]
    fn test_parse_rhythm_with_rests() {
        let tokens = parse_rhythm("q qr e e").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(!tokens[0].rest);
        assert!(tokens[1].rest);
        assert_eq!(onset_ticks(&tokens), vec![0, 1920, 2400]);
    }

    #[test]
    fn test_parse_rhythm_rejects_unknown() {
        assert!(matches!(parse_rhythm("q x q"), Err(Error::Notation(_))));
        assert!(matches!(parse_rhythm("q.."), Err(Error::Notation(_))));
    }

    #[test]
    fn test_ticks_to_ms_quarters() {
        for tempo in [60u32, 80, 97, 120, 200] {
            for beat in 0..4u64 {
                let expected = (beat as f64 * 60_000.0 / tempo as f64).round() as u64;
                assert_eq!(ticks_to_ms(beat * TICKS_PER_QUARTER, tempo), expected);
            }
        }
    }

    #[test]
    fn test_triplets_do_not_drift() {
        let tokens = parse_rhythm("t t t t t t q").unwrap();
        let onsets = onset_ticks(&tokens);
        // Six triplets span exactly two beats
        assert_eq!(ticks_to_ms(onsets[6], 120), 1000);
    }

    #[test]
    fn test_reference_to_ms() {
        assert_eq!(reference_to_ms(1000.0, 750.0), 750);
        assert_eq!(reference_to_ms(1500.0, 500.0), 750);
        assert_eq!(reference_to_ms(0.0, 500.0), 0);
    }
}
