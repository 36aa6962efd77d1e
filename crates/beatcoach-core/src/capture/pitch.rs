use tracing::{debug, trace};

use super::{CaptureKind, CaptureLink, CaptureSource, CapturedEvent};
use crate::config::PitchDebounceConfig;
use crate::device::RawInput;
use crate::error::Result;
use crate::timeline::hz_to_midi;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    reference_midi: f64,
    first_at_ms: u64,
    last_at_ms: u64,
    samples: u32,
    midi_sum: f64,
    confidence_sum: f32,
}

impl Candidate {
    fn new(midi: f64, at_ms: u64, confidence: f32) -> Self {
        Self {
            reference_midi: midi,
            first_at_ms: at_ms,
            last_at_ms: at_ms,
            samples: 1,
            midi_sum: midi,
            confidence_sum: confidence,
        }
    }
}

/// Turns periodic pitch estimates into discrete note onsets.
///
/// A note is emitted once its estimate has held within `max_jitter_cents`
/// for `min_stable_samples` samples spanning `stable_window_ms`. A held note
/// is not emitted again until the pitch moves or confidence drops.
#[derive(Debug, Clone)]
pub struct PitchDebouncer {
    config: PitchDebounceConfig,
    candidate: Option<Candidate>,
    sounding_midi: Option<f64>,
}

impl PitchDebouncer {
    pub fn new(config: PitchDebounceConfig) -> Self {
        Self {
            config,
            candidate: None,
            sounding_midi: None,
        }
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.sounding_midi = None;
    }

    fn within_jitter(&self, a: f64, b: f64) -> bool {
        ((a - b) * 100.0).abs() <= self.config.max_jitter_cents as f64
    }

    /// Feed one sample with a round-local timestamp.
    pub fn push(&mut self, at_ms: u64, frequency_hz: f32, confidence: f32) -> Option<CapturedEvent> {
        // Late sample from an earlier batch; the candidate has moved past it
        if self.candidate.is_some_and(|c| at_ms < c.last_at_ms) {
            trace!("Ignoring late pitch sample at {}ms", at_ms);
            return None;
        }

        let midi = match hz_to_midi(frequency_hz as f64) {
            Some(m) if confidence >= self.config.min_confidence => m,
            _ => {
                // Unvoiced or unreliable: note-off
                self.reset();
                return None;
            }
        };

        if let Some(sounding) = self.sounding_midi {
            if self.within_jitter(midi, sounding) {
                return None;
            }
            self.sounding_midi = None;
        }

        let candidate = match self.candidate {
            Some(c) if self.within_jitter(midi, c.reference_midi) => {
                let mut c = c;
                c.samples += 1;
                c.last_at_ms = at_ms;
                c.midi_sum += midi;
                c.confidence_sum += confidence;
                c
            }
            _ => Candidate::new(midi, at_ms, confidence),
        };

        let held_ms = candidate.last_at_ms - candidate.first_at_ms;
        if candidate.samples >= self.config.min_stable_samples
            && held_ms >= self.config.stable_window_ms
        {
            let mean_midi = candidate.midi_sum / candidate.samples as f64;
            let mean_confidence = candidate.confidence_sum / candidate.samples as f32;
            self.sounding_midi = Some(mean_midi);
            self.candidate = None;
            trace!("Stable pitch {:.2} at {}ms", mean_midi, candidate.first_at_ms);
            return Some(CapturedEvent::pitch(
                candidate.first_at_ms,
                mean_midi,
                mean_confidence,
            ));
        }

        self.candidate = Some(candidate);
        None
    }
}

/// Continuous source: debounced microphone pitch estimates.
pub struct PitchCapture {
    link: CaptureLink,
    debouncer: PitchDebouncer,
}

impl PitchCapture {
    pub fn new(link: CaptureLink, config: PitchDebounceConfig) -> Self {
        Self {
            link,
            debouncer: PitchDebouncer::new(config),
        }
    }
}

impl CaptureSource for PitchCapture {
    fn kind(&self) -> CaptureKind {
        CaptureKind::Continuous
    }

    fn start_capture(&mut self, origin_ms: u64) -> Result<()> {
        self.debouncer.reset();
        self.link.open(origin_ms)
    }

    fn drain(&mut self) -> Vec<CapturedEvent> {
        let raw = self.link.drain_raw();
        let mut events = Vec::new();
        for input in raw {
            match input {
                RawInput::Pitch {
                    at_ms,
                    frequency_hz,
                    confidence,
                } => {
                    let local = self.link.local_ms(at_ms);
                    if let Some(event) = self.debouncer.push(local, frequency_hz, confidence) {
                        events.push(event);
                    }
                }
                other => debug!("Ignoring non-pitch input on continuous source: {:?}", other),
            }
        }
        events
    }

    fn suspend(&mut self) {
        self.link.suspend();
    }

    fn resume(&mut self, origin_ms: u64, now_ms: u64) {
        // A note held across the pause must be re-established
        self.debouncer.reset();
        self.link.resume(origin_ms, now_ms);
    }

    fn stop(&mut self) {
        self.link.close();
        self.debouncer.reset();
    }

    fn is_active(&self) -> bool {
        self.link.is_open()
    }

    fn supports_resume(&self) -> bool {
        self.link.supports_resume()
    }
}
