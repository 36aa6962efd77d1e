//! In-memory Session API for tests and offline simulation.

use std::sync::{Arc, Mutex};

use super::{RewardResult, SessionApi, SessionId, SessionSubmission};
use crate::error::{Error, Result};

/// Shared view of the calls a `ScriptedSessionApi` received.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    started: Arc<Mutex<Vec<(String, String, String)>>>,
    submissions: Arc<Mutex<Vec<SessionSubmission>>>,
}

impl SessionLog {
    pub fn started(&self) -> Vec<(String, String, String)> {
        self.started.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn submissions(&self) -> Vec<SessionSubmission> {
        self.submissions.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// Session API returning a fixed session id and reward.
#[derive(Debug, Clone)]
pub struct ScriptedSessionApi {
    session_id: String,
    reward: RewardResult,
    fail_start: bool,
    fail_completion: bool,
    log: SessionLog,
}

impl ScriptedSessionApi {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            reward: RewardResult::default(),
            fail_start: false,
            fail_completion: false,
            log: SessionLog::default(),
        }
    }

    pub fn with_reward(mut self, reward: RewardResult) -> Self {
        self.reward = reward;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_completion(mut self) -> Self {
        self.fail_completion = true;
        self
    }

    pub fn log(&self) -> SessionLog {
        self.log.clone()
    }
}

impl SessionApi for ScriptedSessionApi {
    fn start_session(&mut self, user_id: &str, game_id: &str, level_id: &str) -> Result<SessionId> {
        if self.fail_start {
            return Err(Error::Network("scripted start failure".to_string()));
        }
        if let Ok(mut started) = self.log.started.lock() {
            started.push((user_id.to_string(), game_id.to_string(), level_id.to_string()));
        }
        Ok(SessionId(self.session_id.clone()))
    }

    fn complete_session(&mut self, submission: &SessionSubmission) -> Result<RewardResult> {
        if let Ok(mut submissions) = self.log.submissions.lock() {
            submissions.push(submission.clone());
        }
        if self.fail_completion {
            return Err(Error::Network("scripted completion failure".to_string()));
        }
        Ok(self.reward)
    }
}
