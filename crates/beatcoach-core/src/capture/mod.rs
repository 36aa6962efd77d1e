//! Capture adapters.
//!
//! A `CaptureSource` turns a device's raw samples into `CapturedEvent`s on
//! the round-local time base. Samples cross from the device thread through a
//! bounded queue and are drained once per engine tick.

mod link;
mod pitch;
mod tap;

pub use link::*;
pub use pitch::*;
pub use tap::*;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::config::EngineConfig;
use crate::device::CaptureDevice;
use crate::error::Result;
use crate::retry::FixedDelay;
use crate::timeline::TimelineKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    /// Taps or clicks; timestamps are monotonic.
    Discrete,
    /// Periodic pitch estimates; delivery order is not guaranteed.
    Continuous,
}

impl From<TimelineKind> for CaptureKind {
    fn from(kind: TimelineKind) -> Self {
        match kind {
            TimelineKind::Rhythm => Self::Discrete,
            TimelineKind::Melody => Self::Continuous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CapturedValue {
    Tap,
    /// Fractional MIDI note number of the sung pitch.
    Pitch { midi: f64 },
}

/// A single observed input during Listening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapturedEvent {
    /// Relative to the start of listening, excluding paused time.
    pub timestamp_ms: u64,
    pub value: CapturedValue,
    pub confidence: Option<f32>,
}

impl CapturedEvent {
    pub fn tap(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            value: CapturedValue::Tap,
            confidence: None,
        }
    }

    pub fn pitch(timestamp_ms: u64, midi: f64, confidence: f32) -> Self {
        Self {
            timestamp_ms,
            value: CapturedValue::Pitch { midi },
            confidence: Some(confidence),
        }
    }
}

/// Capability contract shared by discrete and continuous sources.
pub trait CaptureSource: Send {
    fn kind(&self) -> CaptureKind;

    /// Acquire and start the device. `origin_ms` is the clock time of listen start.
    ///
    /// Fails with `Error::DeviceUnavailable` when the device cannot be acquired.
    fn start_capture(&mut self, origin_ms: u64) -> Result<()>;

    /// Events captured since the previous drain.
    fn drain(&mut self) -> Vec<CapturedEvent>;

    /// Stop delivering input (pause). Callers drain first; anything still
    /// queued, or produced while suspended, is discarded.
    fn suspend(&mut self);

    /// Continue delivering input on a new origin; input from before `now_ms` is discarded.
    fn resume(&mut self, origin_ms: u64, now_ms: u64);

    /// Stop and release the device. Safe to call on every exit path.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Whether `resume` can continue a suspended capture faithfully.
    fn supports_resume(&self) -> bool;
}

/// Wrap `device` in the capture source for `kind`, configured from `config`.
pub fn capture_source(
    kind: CaptureKind,
    device: Box<dyn CaptureDevice>,
    config: &EngineConfig,
) -> Box<dyn CaptureSource> {
    let link = CaptureLink::new(
        device,
        config.capture_queue_capacity,
        FixedDelay::for_acquisition(config),
    );
    match kind {
        CaptureKind::Discrete => Box::new(TapCapture::new(link)),
        CaptureKind::Continuous => Box::new(PitchCapture::new(link, config.pitch)),
    }
}
