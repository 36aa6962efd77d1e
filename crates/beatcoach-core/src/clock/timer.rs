/// A cancellable one-shot timer measured against a `Clock`.
///
/// Pausing freezes elapsed time; resuming continues from the frozen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseTimer {
    duration_ms: u64,
    /// Elapsed time accumulated before the current run segment.
    banked_ms: u64,
    /// Start of the current run segment; `None` while paused or idle.
    running_since: Option<u64>,
    armed: bool,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ms: u64, duration_ms: u64) {
        *self = Self {
            duration_ms,
            banked_ms: 0,
            running_since: Some(now_ms),
            armed: true,
        };
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn pause(&mut self, now_ms: u64) {
        if let Some(since) = self.running_since.take() {
            self.banked_ms += now_ms.saturating_sub(since);
        }
    }

    pub fn resume(&mut self, now_ms: u64) {
        if self.armed && self.running_since.is_none() {
            self.running_since = Some(now_ms);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let current = self
            .running_since
            .map(|since| now_ms.saturating_sub(since))
            .unwrap_or(0);
        self.banked_ms + current
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.duration_ms.saturating_sub(self.elapsed_ms(now_ms))
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.armed && self.elapsed_ms(now_ms) >= self.duration_ms
    }

    /// Clock time at which elapsed was zero, given the time spent paused so far.
    ///
    /// Used to map clock timestamps onto the phase-local time base.
    pub fn origin_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.elapsed_ms(now_ms))
    }
}
