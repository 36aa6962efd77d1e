//! Scripted devices for tests and offline simulation.
//!
//! `ScriptedCaptureDevice` hands out a `CaptureFeed` that any thread can push
//! raw inputs through while the device is started, mimicking a platform
//! input thread. `RecordingPlaybackDevice` records every playback request.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Sender, TrySendError};

use super::{CaptureDevice, PlaybackDevice, RawInput};
use crate::error::{Error, Result};
use crate::timeline::ExpectedEvent;

#[derive(Debug, Default)]
struct CaptureShared {
    sink: Mutex<Option<Sender<RawInput>>>,
    acquired: AtomicBool,
    acquire_calls: AtomicU32,
    release_calls: AtomicU32,
    dropped: AtomicU32,
}

/// Producer handle for a `ScriptedCaptureDevice`.
#[derive(Debug, Clone)]
pub struct CaptureFeed {
    shared: Arc<CaptureShared>,
}

impl CaptureFeed {
    /// Push a raw input. Returns `false` if the device is not capturing or the queue is full.
    pub fn push(&self, input: RawInput) -> bool {
        let Ok(guard) = self.shared.sink.lock() else {
            return false;
        };
        match guard.as_ref().map(|sink| sink.try_send(input)) {
            Some(Ok(())) => true,
            Some(Err(TrySendError::Full(_))) => {
                self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                false
            }
            Some(Err(TrySendError::Disconnected(_))) | None => false,
        }
    }

    pub fn tap(&self, at_ms: u64) -> bool {
        self.push(RawInput::Tap { at_ms })
    }

    pub fn pitch(&self, at_ms: u64, frequency_hz: f32, confidence: f32) -> bool {
        self.push(RawInput::Pitch {
            at_ms,
            frequency_hz,
            confidence,
        })
    }

    pub fn is_capturing(&self) -> bool {
        self.shared
            .sink
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    pub fn is_acquired(&self) -> bool {
        self.shared.acquired.load(Ordering::SeqCst)
    }

    pub fn acquire_calls(&self) -> u32 {
        self.shared.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> u32 {
        self.shared.release_calls.load(Ordering::SeqCst)
    }

    /// Inputs rejected because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.shared.dropped.load(Ordering::SeqCst)
    }
}

/// Capture device driven by a `CaptureFeed`.
#[derive(Debug)]
pub struct ScriptedCaptureDevice {
    name: String,
    shared: Arc<CaptureShared>,
    /// Acquisition attempts that fail before one succeeds; `u32::MAX` never succeeds.
    failures_remaining: u32,
    resumable: bool,
}

impl ScriptedCaptureDevice {
    pub fn new(name: &str) -> (Self, CaptureFeed) {
        let shared = Arc::new(CaptureShared::default());
        let device = Self {
            name: name.to_string(),
            shared: Arc::clone(&shared),
            failures_remaining: 0,
            resumable: true,
        };
        (device, CaptureFeed { shared })
    }

    /// A device whose acquisition always fails (permission denied).
    pub fn unavailable(name: &str) -> (Self, CaptureFeed) {
        let (device, feed) = Self::new(name);
        (device.failing(u32::MAX), feed)
    }

    /// Fail the next `count` acquisition attempts.
    pub fn failing(mut self, count: u32) -> Self {
        self.failures_remaining = count;
        self
    }

    /// A device that cannot continue after a pause.
    pub fn without_resume(mut self) -> Self {
        self.resumable = false;
        self
    }
}

impl CaptureDevice for ScriptedCaptureDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&mut self) -> Result<()> {
        self.shared.acquire_calls.fetch_add(1, Ordering::SeqCst);
        if self.failures_remaining > 0 {
            if self.failures_remaining != u32::MAX {
                self.failures_remaining -= 1;
            }
            return Err(Error::DeviceUnavailable(format!(
                "{}: permission denied",
                self.name
            )));
        }
        self.shared.acquired.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn start(&mut self, sink: Sender<RawInput>) -> Result<()> {
        if !self.shared.acquired.load(Ordering::SeqCst) {
            return Err(Error::DeviceUnavailable(format!(
                "{}: started before acquisition",
                self.name
            )));
        }
        if let Ok(mut guard) = self.shared.sink.lock() {
            *guard = Some(sink);
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut guard) = self.shared.sink.lock() {
            guard.take();
        }
    }

    fn release(&mut self) {
        self.stop();
        if self.shared.acquired.swap(false, Ordering::SeqCst) {
            self.shared.release_calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn supports_resume(&self) -> bool {
        self.resumable
    }
}

/// A single `play` request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackCall {
    pub event_count: usize,
    pub from_ms: u64,
}

/// Playback device that records requests and never produces sound.
#[derive(Debug, Clone)]
pub struct RecordingPlaybackDevice {
    calls: Arc<Mutex<Vec<PlaybackCall>>>,
    stops: Arc<AtomicU32>,
    finished: Arc<AtomicBool>,
    resumable: bool,
    fail: bool,
}

impl RecordingPlaybackDevice {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            stops: Arc::new(AtomicU32::new(0)),
            finished: Arc::new(AtomicBool::new(false)),
            resumable: true,
            fail: false,
        }
    }

    /// A device that cannot seek, forcing the restart-round fallback on resume.
    pub fn without_resume(mut self) -> Self {
        self.resumable = false;
        self
    }

    /// A device whose `play` always fails.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> Vec<PlaybackCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn stop_count(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }

    /// Raise the completion signal.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

impl Default for RecordingPlaybackDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackDevice for RecordingPlaybackDevice {
    fn play(&mut self, events: &[ExpectedEvent], from_ms: u64) -> Result<()> {
        if self.fail {
            return Err(Error::DeviceUnavailable("playback output busy".to_string()));
        }
        self.finished.store(false, Ordering::SeqCst);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(PlaybackCall {
                event_count: events.len(),
                from_ms,
            });
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn supports_resume(&self) -> bool {
        self.resumable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_feed_requires_started_device() {
        let (mut device, feed) = ScriptedCaptureDevice::new("touch");
        assert!(!feed.tap(10));

        let (tx, rx) = bounded(4);
        device.acquire().unwrap();
        device.start(tx).unwrap();
        assert!(feed.tap(10));
        assert_eq!(rx.try_recv().unwrap(), RawInput::Tap { at_ms: 10 });

        device.stop();
        assert!(!feed.tap(20));
    }

    #[test]
    fn test_full_queue_drops() {
        let (mut device, feed) = ScriptedCaptureDevice::new("touch");
        let (tx, _rx) = bounded(1);
        device.acquire().unwrap();
        device.start(tx).unwrap();
        assert!(feed.tap(1));
        assert!(!feed.tap(2));
        assert_eq!(feed.dropped(), 1);
    }

    #[test]
    fn test_unavailable_device() {
        let (mut device, feed) = ScriptedCaptureDevice::unavailable("mic");
        assert!(matches!(device.acquire(), Err(Error::DeviceUnavailable(_))));
        assert!(matches!(device.acquire(), Err(Error::DeviceUnavailable(_))));
        assert_eq!(feed.acquire_calls(), 2);
        assert!(!feed.is_acquired());
    }

    #[test]
    fn test_failing_then_available() {
        let (device, feed) = ScriptedCaptureDevice::new("mic");
        let mut device = device.failing(1);
        assert!(device.acquire().is_err());
        assert!(device.acquire().is_ok());
        assert!(feed.is_acquired());
    }

    #[test]
    fn test_release_counts_once() {
        let (mut device, feed) = ScriptedCaptureDevice::new("touch");
        device.acquire().unwrap();
        device.release();
        device.release();
        assert_eq!(feed.release_calls(), 1);
    }

    #[test]
    fn test_start_without_acquire_fails() {
        let (mut device, _feed) = ScriptedCaptureDevice::new("touch");
        let (tx, _rx) = bounded(1);
        assert!(device.start(tx).is_err());
    }

    #[test]
    fn test_recording_playback() {
        let playback = RecordingPlaybackDevice::new();
        let mut device = playback.clone();
        device.play(&[], 250).unwrap();
        assert!(!device.is_finished());
        playback.finish();
        assert!(device.is_finished());
        assert_eq!(
            playback.calls(),
            vec![PlaybackCall {
                event_count: 0,
                from_ms: 250
            }]
        );
    }
}
