use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timeline::{Melody, RhythmPattern, TimelineKind};

/// The material a level draws its rounds from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelMaterial {
    Patterns(Vec<RhythmPattern>),
    Melodies(Vec<Melody>),
}

impl LevelMaterial {
    pub fn len(&self) -> usize {
        match self {
            Self::Patterns(p) => p.len(),
            Self::Melodies(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> TimelineKind {
        match self {
            Self::Patterns(_) => TimelineKind::Rhythm,
            Self::Melodies(_) => TimelineKind::Melody,
        }
    }
}

/// Level configuration consumed from the surrounding mini-game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub game_id: String,
    pub level_id: String,
    pub tempo_bpm: i32,
    pub rounds: u32,
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default)]
    pub time_limit_seconds: Option<u32>,
    #[serde(flatten)]
    pub material: LevelMaterial,
}

impl LevelConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let level: Self = serde_json::from_str(&content)?;
        level.validate()?;
        Ok(level)
    }

    /// Reject configurations that cannot produce a round.
    pub fn validate(&self) -> Result<()> {
        if self.tempo_bpm <= 0 {
            return Err(Error::config(format!(
                "tempo must be positive, got {} bpm",
                self.tempo_bpm
            )));
        }
        if self.rounds == 0 {
            return Err(Error::config("level must have at least one round"));
        }
        if self.material.is_empty() {
            return Err(Error::config(format!(
                "level {} has an empty pattern/melody set",
                self.level_id
            )));
        }
        Ok(())
    }

    /// Beat length in milliseconds (60000 / tempo).
    pub fn beat_duration_ms(&self) -> f64 {
        60_000.0 / self.tempo_bpm as f64
    }

    pub fn time_limit_ms(&self) -> Option<u64> {
        self.time_limit_seconds.map(|s| s as u64 * 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::PatternBody;

    fn rhythm_level(tempo: i32) -> LevelConfig {
        LevelConfig {
            game_id: "rhythm".to_string(),
            level_id: "r1".to_string(),
            tempo_bpm: tempo,
            rounds: 2,
            difficulty: 1,
            time_limit_seconds: None,
            material: LevelMaterial::Patterns(vec![RhythmPattern::notation("basic", "q q q q")]),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(rhythm_level(80).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_tempo() {
        assert!(matches!(rhythm_level(0).validate(), Err(Error::Config(_))));
        assert!(matches!(rhythm_level(-60).validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_set() {
        let mut level = rhythm_level(80);
        level.material = LevelMaterial::Melodies(vec![]);
        assert!(matches!(level.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_beat_duration() {
        assert_eq!(rhythm_level(80).beat_duration_ms(), 750.0);
        assert_eq!(rhythm_level(120).beat_duration_ms(), 500.0);
    }

    #[test]
    fn test_parse_json_patterns() {
        let json = r#"{
            "game_id": "rhythm-tap",
            "level_id": "1-1",
            "tempo_bpm": 90,
            "rounds": 3,
            "patterns": [
                { "name": "four", "notation": "q q q q" },
                { "name": "raw", "offsets": [0, 1000, 1500], "weight": 3 }
            ]
        }"#;
        let level: LevelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(level.difficulty, 0);
        assert_eq!(level.time_limit_seconds, None);
        match &level.material {
            LevelMaterial::Patterns(p) => {
                assert_eq!(p.len(), 2);
                assert_eq!(p[1].weight, 3);
                assert!(matches!(p[1].body, PatternBody::Offsets(_)));
            }
            other => panic!("expected patterns, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_json_melodies() {
        let json = r#"{
            "game_id": "solfege",
            "level_id": "2-4",
            "tempo_bpm": 72,
            "rounds": 1,
            "difficulty": 2,
            "time_limit_seconds": 20,
            "melodies": [ { "name": "scale", "notes": "do re mi fa sol" } ]
        }"#;
        let level: LevelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(level.time_limit_ms(), Some(20_000));
        assert!(matches!(level.material, LevelMaterial::Melodies(ref m) if m.len() == 1));
    }
}
