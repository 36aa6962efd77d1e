use thiserror::Error;

use crate::phase::Phase;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid notation: {0}")]
    Notation(String),

    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Cannot {action} while in {from} phase")]
    InvalidTransition { from: Phase, action: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "api")]
impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        let message = match &e {
            ureq::Error::StatusCode(code) => format!("HTTP {} error", code),
            ureq::Error::Timeout(_) => format!("Request timed out: {}", e),
            ureq::Error::ConnectionFailed => format!("Connection failed: {}", e),
            _ => format!("HTTP error: {}", e),
        };
        Error::Network(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = Error::InvalidTransition {
            from: Phase::Idle,
            action: "pause",
        };
        assert_eq!(err.to_string(), "Cannot pause while in Idle phase");
    }
}
