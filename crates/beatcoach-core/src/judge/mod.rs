//! Matching and scoring.
//!
//! - `match_events` - greedy assignment of captured events to the timeline
//! - `score_round` - combo and point fold over the matches
//! - `RoundResult` - counts, score and success flag for one round

mod classification;
mod matcher;
mod result;
mod score;

pub use classification::*;
pub use matcher::*;
pub use result::*;
pub use score::*;
