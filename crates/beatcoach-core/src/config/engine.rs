use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DifficultyProfile, capture, pitch, rewards, timing};
use crate::error::{Error, Result};

/// Debouncing applied to continuous pitch estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchDebounceConfig {
    pub min_confidence: f32,
    pub stable_window_ms: u64,
    pub min_stable_samples: u32,
    pub max_jitter_cents: f32,
}

impl Default for PitchDebounceConfig {
    fn default() -> Self {
        Self {
            min_confidence: pitch::MIN_CONFIDENCE,
            stable_window_ms: pitch::STABLE_WINDOW_MS,
            min_stable_samples: pitch::MIN_STABLE_SAMPLES,
            max_jitter_cents: pitch::MAX_JITTER_CENTS,
        }
    }
}

/// Local reward computation, used when the Session API cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub star_thresholds: [f64; 3],
    pub xp_per_correct: u32,
    pub xp_per_star: u32,
    pub coins_per_star: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            star_thresholds: rewards::STAR_THRESHOLDS,
            xp_per_correct: rewards::XP_PER_CORRECT,
            xp_per_star: rewards::XP_PER_STAR,
            coins_per_star: rewards::COINS_PER_STAR,
        }
    }
}

/// Engine-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub countdown_steps: u32,
    pub countdown_step_ms: u64,
    pub trailing_margin_ms: u64,
    pub timeout_margin_ms: u64,
    pub tick_interval_ms: u64,
    pub capture_queue_capacity: usize,
    pub acquire_attempts: u32,
    pub acquire_retry_delay_ms: u64,
    pub allow_manual_submit: bool,
    pub pitch: PitchDebounceConfig,
    pub difficulties: Vec<DifficultyProfile>,
    pub rewards: RewardConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            countdown_steps: timing::COUNTDOWN_STEPS,
            countdown_step_ms: timing::COUNTDOWN_STEP_MS,
            trailing_margin_ms: timing::TRAILING_MARGIN_MS,
            timeout_margin_ms: timing::TIMEOUT_MARGIN_MS,
            tick_interval_ms: timing::TICK_INTERVAL_MS,
            capture_queue_capacity: capture::QUEUE_CAPACITY,
            acquire_attempts: capture::ACQUIRE_ATTEMPTS,
            acquire_retry_delay_ms: capture::ACQUIRE_RETRY_DELAY_MS,
            allow_manual_submit: false,
            pitch: PitchDebounceConfig::default(),
            difficulties: vec![
                DifficultyProfile::easy(),
                DifficultyProfile::normal(),
                DifficultyProfile::hard(),
            ],
            rewards: RewardConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulties.is_empty() {
            return Err(Error::config("at least one difficulty profile is required"));
        }
        for profile in &self.difficulties {
            profile.validate().map_err(Error::Config)?;
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::config("tick interval must be positive"));
        }
        if self.capture_queue_capacity == 0 {
            return Err(Error::config("capture queue capacity must be positive"));
        }
        if self.acquire_attempts == 0 {
            return Err(Error::config("at least one acquisition attempt is required"));
        }
        Ok(())
    }

    /// Profile for a level difficulty, clamped to the hardest configured profile.
    pub fn profile_for(&self, difficulty: u8) -> &DifficultyProfile {
        let index = (difficulty as usize).min(self.difficulties.len().saturating_sub(1));
        &self.difficulties[index]
    }

    /// Total countdown length.
    pub fn countdown_ms(&self) -> u64 {
        self.countdown_steps as u64 * self.countdown_step_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_profile_for_clamps() {
        let config = EngineConfig::default();
        assert_eq!(config.profile_for(0).name, "easy");
        assert_eq!(config.profile_for(1).name, "normal");
        assert_eq!(config.profile_for(2).name, "hard");
        assert_eq!(config.profile_for(9).name, "hard");
    }

    #[test]
    fn test_countdown_ms() {
        let config = EngineConfig::default();
        assert_eq!(config.countdown_ms(), 3000);
    }

    #[test]
    fn test_load_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "countdown_steps": 2, "allow_manual_submit": true }}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.countdown_steps, 2);
        assert!(config.allow_manual_submit);
        assert_eq!(config.tick_interval_ms, timing::TICK_INTERVAL_MS);
        assert_eq!(config.difficulties.len(), 3);
    }

    #[test]
    fn test_load_rejects_empty_profiles() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "difficulties": [] }}"#).unwrap();

        let result = EngineConfig::load(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = EngineConfig::load("/nonexistent/engine.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
