use super::{RewardResult, SessionApi, SessionId, SessionSubmission};
use crate::error::{Error, Result};

/// Session API for offline play. Every call fails with `Error::Network`,
/// so the aggregator always uses the local reward.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSessionApi;

impl SessionApi for OfflineSessionApi {
    fn start_session(&mut self, _user_id: &str, _game_id: &str, _level_id: &str) -> Result<SessionId> {
        Err(Error::Network("offline".to_string()))
    }

    fn complete_session(&mut self, _submission: &SessionSubmission) -> Result<RewardResult> {
        Err(Error::Network("offline".to_string()))
    }

    fn is_remote(&self) -> bool {
        false
    }
}

#[cfg(feature = "api")]
pub use http::HttpSessionApi;

#[cfg(feature = "api")]
mod http {
    use std::time::Duration;

    use serde::Deserialize;
    use tracing::debug;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct StartSessionResponse {
        session_id: String,
    }

    /// JSON-over-HTTP Session API client.
    pub struct HttpSessionApi {
        endpoint: String,
        token: String,
        agent: ureq::Agent,
    }

    impl HttpSessionApi {
        pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Self {
            let config = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build();
            Self {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                token: token.to_string(),
                agent: config.into(),
            }
        }

        fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
            let url = format!("{}{}", self.endpoint, path);
            let mut response = self
                .agent
                .post(&url)
                .header("Authorization", &format!("Bearer {}", self.token))
                .send_json(body)?;
            debug!("API response from {}: {}", url, response.status());
            Ok(response.body_mut().read_json::<T>()?)
        }
    }

    impl SessionApi for HttpSessionApi {
        fn start_session(&mut self, user_id: &str, game_id: &str, level_id: &str) -> Result<SessionId> {
            let body = serde_json::json!({
                "userId": user_id,
                "gameId": game_id,
                "levelId": level_id,
            });
            let response: StartSessionResponse = self.post("/api/sessions", &body)?;
            Ok(SessionId(response.session_id))
        }

        fn complete_session(&mut self, submission: &SessionSubmission) -> Result<RewardResult> {
            let body = serde_json::to_value(submission)?;
            self.post(&format!("/api/sessions/{}/complete", submission.session_id), &body)
        }
    }
}
