//! Engine and level configuration.
//!
//! - `EngineConfig` - phase timing, capture queue, debouncing and reward constants
//! - `DifficultyProfile` - tolerance bands, scoring rules and success threshold
//! - `LevelConfig` - a mini-game level (tempo, rounds, pattern or melody set)

mod engine;
mod level;
mod profile;

pub use engine::*;
pub use level::*;
pub use profile::*;

/// Default phase timing.
pub mod timing {
    /// Countdown steps shown before each round (3, 2, 1).
    pub const COUNTDOWN_STEPS: u32 = 3;

    /// Duration of one countdown step.
    pub const COUNTDOWN_STEP_MS: u64 = 1000;

    /// Time appended to the last reference event before listening opens.
    pub const TRAILING_MARGIN_MS: u64 = 500;

    /// Time appended to the last expected event before the listening deadline fires.
    pub const TIMEOUT_MARGIN_MS: u64 = 2000;

    /// Scheduling tick, matching a ~60 Hz playback/visual clock.
    pub const TICK_INTERVAL_MS: u64 = 16;
}

/// Default capture hand-off and acquisition settings.
///
/// Acquisition fails fast: one attempt, no delay.
pub mod capture {
    /// Bounded queue between the device thread and the engine.
    pub const QUEUE_CAPACITY: usize = 256;

    pub const ACQUIRE_ATTEMPTS: u32 = 1;

    pub const ACQUIRE_RETRY_DELAY_MS: u64 = 0;
}

/// Engine observation channel.
pub mod events {
    /// Per-subscriber queue; events beyond this are dropped, never awaited.
    pub const QUEUE_CAPACITY: usize = 64;
}

/// Default pitch debouncing.
pub mod pitch {
    pub const MIN_CONFIDENCE: f32 = 0.8;
    pub const STABLE_WINDOW_MS: u64 = 60;
    pub const MIN_STABLE_SAMPLES: u32 = 3;
    pub const MAX_JITTER_CENTS: f32 = 35.0;
}

/// Default local reward computation.
pub mod rewards {
    /// Accuracy needed for 3, 2 and 1 stars.
    pub const STAR_THRESHOLDS: [f64; 3] = [0.9, 0.7, 0.5];
    pub const XP_PER_CORRECT: u32 = 2;
    pub const XP_PER_STAR: u32 = 10;
    pub const COINS_PER_STAR: u32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_constants() {
        assert_eq!(timing::COUNTDOWN_STEPS, 3);
        assert_eq!(timing::TICK_INTERVAL_MS, 16);
        assert!(timing::TIMEOUT_MARGIN_MS > timing::TRAILING_MARGIN_MS);
    }

    #[test]
    fn test_star_thresholds_descending() {
        let t = rewards::STAR_THRESHOLDS;
        assert!(t[0] > t[1] && t[1] > t[2]);
    }

    #[test]
    fn test_acquisition_fails_fast_by_default() {
        assert_eq!(capture::ACQUIRE_ATTEMPTS, 1);
        assert_eq!(capture::ACQUIRE_RETRY_DELAY_MS, 0);
    }
}
