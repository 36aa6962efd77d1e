use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::notation::{onset_ticks, reference_to_ms, ticks_to_ms};
use super::pattern::{Melody, PatternBody, RhythmPattern, parse_melody, pattern_tokens};
use super::{EventId, ExpectedEvent, ExpectedValue, Tolerance};
use crate::config::{DifficultyProfile, LevelConfig, LevelMaterial};
use crate::error::{Error, Result};

/// How the builder picks material for each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSeed {
    /// Fresh entropy per session.
    Random,
    /// Caller-supplied seed.
    Fixed(u64),
    /// Same timeline for every player on the given day.
    Daily(NaiveDate),
}

/// Stable seed for a "daily" variant (FNV-1a over the ISO date and game id).
pub fn daily_seed(date: NaiveDate, game_id: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let key = format!("{}:{}", date.format("%Y-%m-%d"), game_id);
    key.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    Rhythm,
    Melody,
}

/// One round's reference timeline, strictly ordered by offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub source: String,
    pub kind: TimelineKind,
    pub tempo_bpm: u32,
    pub events: Vec<ExpectedEvent>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offset of the final event (0 for an empty timeline).
    pub fn last_offset_ms(&self) -> u64 {
        self.events.last().map(|e| e.time_offset_ms).unwrap_or(0)
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.events.iter().map(|e| e.time_offset_ms).collect()
    }
}

/// Builds a timeline per round from a level configuration.
pub struct TimelineBuilder {
    level: LevelConfig,
    profile: DifficultyProfile,
    rng: StdRng,
}

impl TimelineBuilder {
    pub fn new(level: LevelConfig, profile: DifficultyProfile, seed: SelectionSeed) -> Result<Self> {
        level.validate()?;
        let seed = match seed {
            SelectionSeed::Random => rand::random(),
            SelectionSeed::Fixed(seed) => seed,
            SelectionSeed::Daily(date) => daily_seed(date, &level.game_id),
        };
        debug!("Timeline builder for {} seeded with {}", level.level_id, seed);

        Ok(Self {
            level,
            profile,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Select material and build the next round's timeline.
    pub fn next_round(&mut self) -> Result<Timeline> {
        let tempo = self.level.tempo_bpm as u32;
        match &self.level.material {
            LevelMaterial::Patterns(patterns) => {
                let index = pick_weighted(&mut self.rng, patterns.iter().map(|p| p.weight))?;
                build_rhythm(&patterns[index], tempo, &self.profile)
            }
            LevelMaterial::Melodies(melodies) => {
                let index = pick_weighted(&mut self.rng, melodies.iter().map(|m| m.weight))?;
                build_melody(&melodies[index], tempo, &self.profile)
            }
        }
    }
}

fn pick_weighted<R: Rng>(rng: &mut R, weights: impl Iterator<Item = u32> + Clone) -> Result<usize> {
    let total: u64 = weights.clone().map(u64::from).sum();
    if total == 0 {
        return Err(Error::config("pattern/melody set resolves to empty (all weights are zero)"));
    }

    let mut roll = rng.random_range(0..total);
    for (index, weight) in weights.enumerate() {
        let weight = u64::from(weight);
        if roll < weight {
            return Ok(index);
        }
        roll -= weight;
    }
    Err(Error::config("weighted selection out of range"))
}

fn check_tempo(tempo_bpm: u32) -> Result<()> {
    if tempo_bpm == 0 {
        return Err(Error::config("tempo must be positive"));
    }
    Ok(())
}

fn finish(source: &str, kind: TimelineKind, tempo_bpm: u32, events: Vec<ExpectedEvent>) -> Result<Timeline> {
    if events.is_empty() {
        return Err(Error::config(format!("'{}' has no sounding events", source)));
    }
    if events.windows(2).any(|w| w[0].time_offset_ms >= w[1].time_offset_ms) {
        return Err(Error::config(format!(
            "'{}' has coinciding onsets at {} bpm",
            source, tempo_bpm
        )));
    }
    Ok(Timeline {
        source: source.to_string(),
        kind,
        tempo_bpm,
        events,
    })
}

/// Build a rhythm timeline at `tempo_bpm` using the profile's timing windows.
pub fn build_rhythm(pattern: &RhythmPattern, tempo_bpm: u32, profile: &DifficultyProfile) -> Result<Timeline> {
    check_tempo(tempo_bpm)?;
    let tolerance = Tolerance::Timing(profile.timing);

    let offsets: Vec<u64> = match &pattern.body {
        PatternBody::Notation(_) => {
            let tokens = pattern_tokens(pattern)
                .map_err(|e| Error::config(format!("pattern '{}': {}", pattern.name, e)))?
                .unwrap_or_default();
            onset_ticks(&tokens)
                .into_iter()
                .map(|t| ticks_to_ms(t, tempo_bpm))
                .collect()
        }
        PatternBody::Offsets(raw) => {
            if raw.iter().any(|r| !r.is_finite() || *r < 0.0) {
                return Err(Error::config(format!(
                    "pattern '{}' has a negative or non-finite offset",
                    pattern.name
                )));
            }
            let beat_ms = 60_000.0 / tempo_bpm as f64;
            raw.iter().map(|r| reference_to_ms(*r, beat_ms)).collect()
        }
    };

    let events = offsets
        .into_iter()
        .enumerate()
        .map(|(i, offset)| ExpectedEvent {
            id: EventId(i as u32),
            time_offset_ms: offset,
            value: ExpectedValue::Beat(i as u32),
            tolerance,
        })
        .collect();

    finish(&pattern.name, TimelineKind::Rhythm, tempo_bpm, events)
}

/// Build a melody timeline at `tempo_bpm` using the profile's pitch windows.
pub fn build_melody(melody: &Melody, tempo_bpm: u32, profile: &DifficultyProfile) -> Result<Timeline> {
    check_tempo(tempo_bpm)?;
    let tolerance = Tolerance::Pitch(profile.pitch);

    let notes = parse_melody(melody)
        .map_err(|e| Error::config(format!("melody '{}': {}", melody.name, e)))?;
    let rhythm: Vec<_> = notes.iter().map(|n| n.as_rhythm()).collect();
    let onsets = onset_ticks(&rhythm);

    let events = notes
        .iter()
        .filter_map(|n| n.pitch)
        .zip(onsets)
        .enumerate()
        .map(|(i, (pitch, ticks))| ExpectedEvent {
            id: EventId(i as u32),
            time_offset_ms: ticks_to_ms(ticks, tempo_bpm),
            value: ExpectedValue::Pitch(pitch),
            tolerance,
        })
        .collect();

    finish(&melody.name, TimelineKind::Melody, tempo_bpm, events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_with(material: LevelMaterial, tempo: i32) -> LevelConfig {
        LevelConfig {
            game_id: "rhythm".to_string(),
            level_id: "1".to_string(),
            tempo_bpm: tempo,
            rounds: 3,
            difficulty: 1,
            time_limit_seconds: None,
            material,
        }
    }

    #[test]
    fn test_quarter_notes_at_80_bpm() {
        let pattern = RhythmPattern::notation("four", "q q q q");
        let timeline = build_rhythm(&pattern, 80, &DifficultyProfile::normal()).unwrap();
        assert_eq!(timeline.offsets(), vec![0, 750, 1500, 2250]);
        assert_eq!(timeline.kind, TimelineKind::Rhythm);
        assert_eq!(timeline.last_offset_ms(), 2250);
    }

    #[test]
    fn test_reference_offsets_match_beat_duration() {
        let pattern = RhythmPattern::offsets("raw", vec![0.0, 1000.0, 2000.0, 3000.0]);
        for tempo in [40u32, 60, 80, 113, 180] {
            let timeline = build_rhythm(&pattern, tempo, &DifficultyProfile::normal()).unwrap();
            let beat = 60_000.0 / tempo as f64;
            let expected: Vec<u64> = (0..4).map(|i| (i as f64 * beat).round() as u64).collect();
            assert_eq!(timeline.offsets(), expected, "tempo {}", tempo);
        }
    }

    #[test]
    fn test_rests_are_skipped_and_ids_unique() {
        let pattern = RhythmPattern::notation("gaps", "q qr e e h");
        let timeline = build_rhythm(&pattern, 120, &DifficultyProfile::normal()).unwrap();
        assert_eq!(timeline.offsets(), vec![0, 1000, 1250]);
        let ids: Vec<u32> = timeline.events.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_tolerance_comes_from_profile() {
        let pattern = RhythmPattern::notation("one", "q");
        let hard = DifficultyProfile::hard();
        let timeline = build_rhythm(&pattern, 100, &hard).unwrap();
        assert_eq!(timeline.events[0].tolerance, Tolerance::Timing(hard.timing));
    }

    #[test]
    fn test_all_rests_is_config_error() {
        let pattern = RhythmPattern::notation("silence", "qr hr");
        let result = build_rhythm(&pattern, 100, &DifficultyProfile::normal());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_notation_is_config_error() {
        let pattern = RhythmPattern::notation("typo", "q z");
        let result = build_rhythm(&pattern, 100, &DifficultyProfile::normal());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_tempo_is_config_error() {
        let pattern = RhythmPattern::notation("four", "q q q q");
        let result = build_rhythm(&pattern, 0, &DifficultyProfile::normal());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_negative_raw_offset_rejected() {
        let pattern = RhythmPattern::offsets("neg", vec![0.0, -10.0]);
        assert!(build_rhythm(&pattern, 90, &DifficultyProfile::normal()).is_err());
    }

    #[test]
    fn test_unordered_raw_offsets_rejected() {
        let pattern = RhythmPattern::offsets("unordered", vec![0.0, 2000.0, 1000.0]);
        assert!(build_rhythm(&pattern, 90, &DifficultyProfile::normal()).is_err());
    }

    #[test]
    fn test_melody_timeline() {
        let melody = Melody::new("steps", "do re -:q mi:h fa");
        let timeline = build_melody(&melody, 60, &DifficultyProfile::normal()).unwrap();
        assert_eq!(timeline.kind, TimelineKind::Melody);
        assert_eq!(timeline.offsets(), vec![0, 1000, 3000, 5000]);
        match timeline.events[2].value {
            ExpectedValue::Pitch(p) => {
                assert_eq!(p.degree, 3);
                assert_eq!(p.midi, 64);
            }
            other => panic!("expected pitch, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_rejects_invalid_level() {
        let level = level_with(
            LevelMaterial::Patterns(vec![RhythmPattern::notation("a", "q")]),
            0,
        );
        let result = TimelineBuilder::new(level, DifficultyProfile::normal(), SelectionSeed::Random);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_weights_are_config_error() {
        let mut pattern = RhythmPattern::notation("a", "q");
        pattern.weight = 0;
        let level = level_with(LevelMaterial::Patterns(vec![pattern]), 90);
        let mut builder =
            TimelineBuilder::new(level, DifficultyProfile::normal(), SelectionSeed::Fixed(1)).unwrap();
        assert!(matches!(builder.next_round(), Err(Error::Config(_))));
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let patterns: Vec<_> = (0..6)
            .map(|i| RhythmPattern::notation(&format!("p{}", i), "q q"))
            .collect();
        let level = level_with(LevelMaterial::Patterns(patterns), 90);

        let sequence = |seed| {
            let mut builder = TimelineBuilder::new(
                level.clone(),
                DifficultyProfile::normal(),
                SelectionSeed::Fixed(seed),
            )
            .unwrap();
            (0..8)
                .map(|_| builder.next_round().unwrap().source)
                .collect::<Vec<_>>()
        };
        assert_eq!(sequence(42), sequence(42));
    }

    #[test]
    fn test_daily_seed_stable_per_day_and_game() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let next = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert_eq!(daily_seed(day, "rhythm"), daily_seed(day, "rhythm"));
        assert_ne!(daily_seed(day, "rhythm"), daily_seed(next, "rhythm"));
        assert_ne!(daily_seed(day, "rhythm"), daily_seed(day, "solfege"));
    }

    #[test]
    fn test_weighted_pick_never_selects_zero_weight() {
        let mut heavy = RhythmPattern::notation("heavy", "q");
        heavy.weight = 5;
        let mut never = RhythmPattern::notation("never", "q q");
        never.weight = 0;
        let level = level_with(LevelMaterial::Patterns(vec![never, heavy]), 90);
        let mut builder =
            TimelineBuilder::new(level, DifficultyProfile::normal(), SelectionSeed::Fixed(7)).unwrap();
        for _ in 0..50 {
            assert_eq!(builder.next_round().unwrap().source, "heavy");
        }
    }
}
