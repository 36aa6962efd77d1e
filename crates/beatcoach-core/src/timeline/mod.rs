//! Reference timelines.
//!
//! - `ExpectedEvent` - one scheduled beat or note with its tolerance band
//! - `NoteValue`, `parse_rhythm` - symbolic durations in integer ticks
//! - `RhythmPattern`, `Melody` - authored level material
//! - `TimelineBuilder` - turns a level into per-round `Timeline`s

mod builder;
mod event;
mod notation;
mod pattern;

pub use builder::*;
pub use event::*;
pub use notation::*;
pub use pattern::*;
