pub mod capture;
pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod export;
pub mod judge;
pub mod phase;
pub mod retry;
pub mod session;
pub mod timeline;

pub use capture::{CaptureKind, CaptureSource, CapturedEvent, CapturedValue, PitchCapture, TapCapture};
pub use clock::{Clock, ManualClock, PhaseTimer, SystemClock};
pub use config::{DifficultyProfile, EngineConfig, LevelConfig, LevelMaterial};
pub use device::{CaptureDevice, PlaybackDevice, RawInput};
pub use error::{Error, Result};
pub use judge::{Classification, JudgeCounts, MatchResult, RoundResult, match_events, score_round};
pub use phase::{EngineEvent, ListenExit, Phase, RoundEngine, RoundState, SessionBinding};
pub use session::{
    OfflineSessionApi, RewardResult, RewardSource, SessionAggregator, SessionApi, SessionOutcome,
    SessionState,
};
#[cfg(feature = "api")]
pub use session::HttpSessionApi;
pub use timeline::{ExpectedEvent, SelectionSeed, Timeline, TimelineBuilder};
