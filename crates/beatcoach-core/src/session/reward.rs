use std::collections::BTreeMap;

use tracing::warn;

use super::{RewardResult, SessionState};
use crate::config::RewardConfig;

/// Stars for an accuracy ratio: one per threshold reached.
pub fn stars_for_accuracy(accuracy: f64, thresholds: &[f64; 3]) -> u8 {
    thresholds.iter().filter(|&&t| accuracy >= t).count() as u8
}

/// Reward computed on-device when the Session API is unavailable.
pub fn local_reward(state: &SessionState, config: &RewardConfig) -> RewardResult {
    let stars = stars_for_accuracy(state.accuracy(), &config.star_thresholds);
    RewardResult {
        stars,
        xp: state.correct_count * config.xp_per_correct + stars as u32 * config.xp_per_star,
        coins: stars as u32 * config.coins_per_star,
    }
}

/// Counts failed Session API calls per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiErrorTracker {
    failures: BTreeMap<&'static str, u32>,
}

impl ApiErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, endpoint: &'static str) {
        *self.failures.entry(endpoint).or_insert(0) += 1;
    }

    /// Failed calls across all endpoints.
    pub fn total(&self) -> u32 {
        self.failures.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Log a one-line summary if anything failed.
    pub fn report(&self) {
        if self.is_empty() {
            return;
        }
        let summary = self
            .failures
            .iter()
            .map(|(endpoint, count)| format!("{}={}", endpoint, count))
            .collect::<Vec<_>>()
            .join(", ");
        warn!("Session API failures this session: {}", summary);
    }
}
