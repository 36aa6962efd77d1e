//! Session aggregation and the external Session API.
//!
//! - `SessionAggregator` - folds round results, requests the reward once
//! - `SessionApi` - backend collaborator (`HttpSessionApi`, `OfflineSessionApi`)
//! - `local_reward` - star/xp/coin fallback when the backend is unreachable

mod aggregator;
mod api;
pub mod mock;
mod reward;

pub use aggregator::*;
pub use api::*;
pub use reward::*;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Backend identifier for a play session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardResult {
    pub stars: u8,
    pub xp: u32,
    pub coins: u32,
}

/// Totals reported to the backend when a session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSubmission {
    pub session_id: SessionId,
    pub score: u64,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub max_combo: u32,
}

/// Remote session bookkeeping. Failures surface as `Error::Network`.
pub trait SessionApi: Send {
    fn start_session(&mut self, user_id: &str, game_id: &str, level_id: &str) -> Result<SessionId>;

    fn complete_session(&mut self, submission: &SessionSubmission) -> Result<RewardResult>;

    /// False for backends that never reach a server; the aggregator then
    /// skips the calls and uses the local reward directly.
    fn is_remote(&self) -> bool {
        true
    }
}
