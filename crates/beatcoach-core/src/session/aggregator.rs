use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ApiErrorTracker, RewardResult, SessionApi, SessionId, SessionSubmission, local_reward};
use crate::config::RewardConfig;
use crate::judge::RoundResult;

/// Running totals for one play session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub rounds_completed: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub max_combo: u32,
    pub cumulative_score: u64,
}

impl SessionState {
    /// Fold one evaluated round into the totals.
    pub fn record(&mut self, round: &RoundResult) {
        self.rounds_completed += 1;
        self.correct_count += round.judge.correct();
        self.wrong_count += round.judge.wrong();
        self.max_combo = self.max_combo.max(round.max_combo);
        // round.score is already floored at zero
        self.cumulative_score += round.score as u64;
    }

    /// correct / (correct + wrong), 0 for an empty session
    pub fn accuracy(&self) -> f64 {
        let judged = self.correct_count + self.wrong_count;
        if judged == 0 {
            return 0.0;
        }
        self.correct_count as f64 / judged as f64
    }
}

/// Where the session's reward came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardSource {
    Remote,
    LocalFallback,
}

/// Final result of a session, produced once by `SessionAggregator::finish`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: Option<SessionId>,
    pub state: SessionState,
    pub reward: RewardResult,
    pub source: RewardSource,
    pub rounds: Vec<RoundResult>,
    /// Session API calls that failed and were absorbed by the fallback.
    #[serde(default)]
    pub api_failures: u32,
}

/// Sole owner of the Session API for a play session.
///
/// Created when the first round starts, fed every evaluated round, and
/// consumed by `finish`, so a session can only be submitted once.
pub struct SessionAggregator {
    api: Box<dyn SessionApi>,
    rewards: RewardConfig,
    session_id: Option<SessionId>,
    state: SessionState,
    rounds: Vec<RoundResult>,
    errors: ApiErrorTracker,
}

impl SessionAggregator {
    /// Open a session with the backend. A failed start is not fatal; the
    /// session then finishes with the local reward.
    pub fn begin(
        mut api: Box<dyn SessionApi>,
        rewards: RewardConfig,
        user_id: &str,
        game_id: &str,
        level_id: &str,
    ) -> Self {
        let mut errors = ApiErrorTracker::new();
        let session_id = if !api.is_remote() {
            debug!("Offline session for {}/{}", game_id, level_id);
            None
        } else {
            match api.start_session(user_id, game_id, level_id) {
                Ok(id) => {
                    info!("Session {} started for {}/{}", id, game_id, level_id);
                    Some(id)
                }
                Err(e) => {
                    warn!("Failed to start remote session: {}", e);
                    errors.record("start_session");
                    None
                }
            }
        };

        Self {
            api,
            rewards,
            session_id,
            state: SessionState::default(),
            rounds: Vec::new(),
            errors,
        }
    }

    /// Backend session id, `None` when offline or the start call failed.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Totals over the rounds recorded so far.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Recorded rounds in completion order.
    pub fn rounds(&self) -> &[RoundResult] {
        &self.rounds
    }

    /// Add a completed round. Cancelled rounds are never recorded.
    pub fn record_round(&mut self, round: &RoundResult) {
        self.state.record(round);
        self.rounds.push(round.clone());
    }

    /// Request the authoritative reward, falling back to the local one.
    ///
    /// The completion call is only made when `begin` obtained a session id.
    /// Failures are logged and counted in `SessionOutcome::api_failures`.
    pub fn finish(mut self) -> SessionOutcome {
        let remote = match &self.session_id {
            Some(id) => {
                let submission = SessionSubmission {
                    session_id: id.clone(),
                    score: self.state.cumulative_score,
                    correct_count: self.state.correct_count,
                    wrong_count: self.state.wrong_count,
                    max_combo: self.state.max_combo,
                };
                match self.api.complete_session(&submission) {
                    Ok(reward) => Some(reward),
                    Err(e) => {
                        warn!("Failed to complete session {}: {}; using local reward", id, e);
                        self.errors.record("complete_session");
                        None
                    }
                }
            }
            None => None,
        };
        self.errors.report();

        let (reward, source) = match remote {
            Some(reward) => (reward, RewardSource::Remote),
            None => (local_reward(&self.state, &self.rewards), RewardSource::LocalFallback),
        };

        info!(
            "Session finished: {} rounds, {} correct, {} wrong, score {}, {} stars ({:?})",
            self.state.rounds_completed,
            self.state.correct_count,
            self.state.wrong_count,
            self.state.cumulative_score,
            reward.stars,
            source
        );

        SessionOutcome {
            session_id: self.session_id,
            state: self.state,
            reward,
            source,
            rounds: self.rounds,
            api_failures: self.errors.total(),
        }
    }
}
