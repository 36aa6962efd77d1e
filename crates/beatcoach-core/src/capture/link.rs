use crossbeam_channel::{Receiver, bounded};
use tracing::{debug, info, warn};

use crate::device::{CaptureDevice, RawInput};
use crate::error::Result;
use crate::retry::{FixedDelay, RetryStrategy};

/// Device ownership plus the bounded hand-off queue.
///
/// The device is released on `close` and again defensively on drop, so every
/// exit path out of Listening gives the hardware back.
pub struct CaptureLink {
    device: Box<dyn CaptureDevice>,
    capacity: usize,
    retry: FixedDelay,
    rx: Option<Receiver<RawInput>>,
    origin_ms: u64,
    suspended: bool,
    /// Raw input at or after this clock time is accepted after a resume.
    accept_from_ms: u64,
    overflow_warned: bool,
}

impl CaptureLink {
    pub fn new(device: Box<dyn CaptureDevice>, capacity: usize, retry: FixedDelay) -> Self {
        Self {
            device,
            capacity: capacity.max(1),
            retry,
            rx: None,
            origin_ms: 0,
            suspended: false,
            accept_from_ms: 0,
            overflow_warned: false,
        }
    }

    pub fn open(&mut self, origin_ms: u64) -> Result<()> {
        self.close();

        let device = &mut self.device;
        self.retry.execute(|attempt| {
            let result = device.acquire();
            if let Err(e) = &result {
                debug!("Acquire attempt {} failed: {}", attempt + 1, e);
            }
            result
        })?;

        let (tx, rx) = bounded(self.capacity);
        if let Err(e) = self.device.start(tx) {
            self.device.release();
            return Err(e);
        }

        info!("Capture started on {}", self.device.name());
        self.rx = Some(rx);
        self.origin_ms = origin_ms;
        self.suspended = false;
        self.accept_from_ms = 0;
        self.overflow_warned = false;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.rx.is_some()
    }

    pub fn origin_ms(&self) -> u64 {
        self.origin_ms
    }

    /// Whether the device can keep delivering input across a pause.
    pub fn supports_resume(&self) -> bool {
        self.device.supports_resume()
    }

    /// Pending raw input, oldest first by timestamp.
    ///
    /// While suspended the queue is emptied and nothing is returned, so input
    /// produced during a pause cannot crowd out input after the resume.
    pub fn drain_raw(&mut self) -> Vec<RawInput> {
        if self.suspended {
            self.discard_pending();
            return Vec::new();
        }
        let Some(rx) = &self.rx else {
            return Vec::new();
        };

        if rx.is_full() && !self.overflow_warned {
            warn!(
                "Capture queue for {} is full ({} entries); input is being dropped",
                self.device.name(),
                self.capacity
            );
            self.overflow_warned = true;
        }

        let accept_from = self.accept_from_ms;
        let mut raw: Vec<RawInput> = rx.try_iter().filter(|r| r.at_ms() >= accept_from).collect();
        raw.sort_by_key(|r| r.at_ms());
        raw
    }

    /// Round-local timestamp for a raw clock timestamp.
    pub fn local_ms(&self, at_ms: u64) -> u64 {
        at_ms.saturating_sub(self.origin_ms)
    }

    /// Stop handing out input. Anything already queued is discarded.
    pub fn suspend(&mut self) {
        self.suspended = true;
        self.discard_pending();
    }

    /// Hand out input again, rebased on `origin_ms`. Input stamped before
    /// `now_ms` is dropped.
    pub fn resume(&mut self, origin_ms: u64, now_ms: u64) {
        self.discard_pending();
        self.origin_ms = origin_ms;
        self.accept_from_ms = now_ms;
        self.suspended = false;
        self.overflow_warned = false;
    }

    fn discard_pending(&mut self) {
        if let Some(rx) = &self.rx {
            let stale = rx.try_iter().count();
            if stale > 0 {
                debug!("Discarded {} inputs received while paused", stale);
            }
        }
    }

    pub fn close(&mut self) {
        if self.rx.take().is_some() {
            self.device.stop();
            info!("Capture stopped on {}", self.device.name());
        }
        self.device.release();
        self.suspended = false;
    }
}

impl Drop for CaptureLink {
    fn drop(&mut self) {
        self.close();
    }
}
