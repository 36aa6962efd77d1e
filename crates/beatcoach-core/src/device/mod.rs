//! Device abstractions injected into the engine.
//!
//! The engine never touches audio hardware directly: capture and playback
//! are trait objects constructed once per engine, so tests and the CLI can
//! substitute the doubles in `mock`.

pub mod mock;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timeline::ExpectedEvent;

/// A raw sample emitted by a capture device thread.
///
/// `at_ms` is expressed in the engine clock's time base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawInput {
    Tap {
        at_ms: u64,
    },
    /// Pitch estimate already computed by the platform's DSP.
    Pitch {
        at_ms: u64,
        frequency_hz: f32,
        confidence: f32,
    },
}

impl RawInput {
    pub fn at_ms(&self) -> u64 {
        match self {
            Self::Tap { at_ms } | Self::Pitch { at_ms, .. } => *at_ms,
        }
    }
}

/// Input hardware (touch surface, microphone).
///
/// Implementations deliver samples from their own thread through `sink`
/// and must never block on it.
pub trait CaptureDevice: Send {
    fn name(&self) -> &str;

    /// Fails with `Error::DeviceUnavailable` on denied permission or busy hardware.
    fn acquire(&mut self) -> Result<()>;

    fn start(&mut self, sink: Sender<RawInput>) -> Result<()>;

    fn stop(&mut self);

    fn release(&mut self);

    /// Whether the device can be suspended and resumed mid-phase. Streams
    /// that restart their clock on every start should return `false`.
    fn supports_resume(&self) -> bool {
        true
    }
}

/// Reference audio output. Fire-and-forget with a completion signal.
pub trait PlaybackDevice: Send {
    /// Play `events` starting `from_ms` into the timeline.
    fn play(&mut self, events: &[ExpectedEvent], from_ms: u64) -> Result<()>;

    fn stop(&mut self);

    /// Completion signal for the current playback.
    fn is_finished(&self) -> bool;

    /// Whether `play` honours a non-zero `from_ms`.
    fn supports_resume(&self) -> bool {
        true
    }
}
