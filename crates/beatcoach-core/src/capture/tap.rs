use tracing::debug;

use super::{CaptureKind, CaptureLink, CaptureSource, CapturedEvent};
use crate::device::RawInput;
use crate::error::Result;

/// Discrete source: every tap becomes one event immediately.
pub struct TapCapture {
    link: CaptureLink,
}

impl TapCapture {
    pub fn new(link: CaptureLink) -> Self {
        Self { link }
    }
}

impl CaptureSource for TapCapture {
    fn kind(&self) -> CaptureKind {
        CaptureKind::Discrete
    }

    fn start_capture(&mut self, origin_ms: u64) -> Result<()> {
        self.link.open(origin_ms)
    }

    fn drain(&mut self) -> Vec<CapturedEvent> {
        let raw = self.link.drain_raw();
        raw.into_iter()
            .filter_map(|input| match input {
                RawInput::Tap { at_ms } => Some(CapturedEvent::tap(self.link.local_ms(at_ms))),
                other => {
                    debug!("Ignoring non-tap input on discrete source: {:?}", other);
                    None
                }
            })
            .collect()
    }

    fn suspend(&mut self) {
        self.link.suspend();
    }

    fn resume(&mut self, origin_ms: u64, now_ms: u64) {
        self.link.resume(origin_ms, now_ms);
    }

    fn stop(&mut self) {
        self.link.close();
    }

    fn is_active(&self) -> bool {
        self.link.is_open()
    }

    fn supports_resume(&self) -> bool {
        self.link.supports_resume()
    }
}
