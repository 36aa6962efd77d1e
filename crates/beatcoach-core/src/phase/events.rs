use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use serde::Serialize;
use tracing::debug;

use super::{ListenExit, Phase};
use crate::capture::CapturedEvent;
use crate::judge::RoundResult;
use crate::session::SessionOutcome;

/// Notifications for UI or logging observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    PhaseChanged { from: Phase, to: Phase },
    /// Countdown steps left, announced once per step.
    CountdownTick { remaining: u32 },
    Captured(CapturedEvent),
    RoundEvaluated { exit: ListenExit, result: Box<RoundResult> },
    /// Capture could not start; the round is scored without input.
    Degraded { reason: String },
    SessionFinished(Box<SessionOutcome>),
}

/// Fan-out of engine events over bounded channels.
///
/// Sends never block: a full subscriber misses events, a disconnected one is
/// dropped.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EngineEvent>>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = bounded(self.capacity);
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Observer queue full, dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_every_subscriber() {
        let mut bus = EventBus::new(4);
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.emit(EngineEvent::CountdownTick { remaining: 3 });
        assert_eq!(a.try_recv().ok(), Some(EngineEvent::CountdownTick { remaining: 3 }));
        assert_eq!(b.try_recv().ok(), Some(EngineEvent::CountdownTick { remaining: 3 }));
    }

    #[test]
    fn test_full_subscriber_does_not_block() {
        let mut bus = EventBus::new(1);
        let rx = bus.subscribe();
        bus.emit(EngineEvent::CountdownTick { remaining: 2 });
        bus.emit(EngineEvent::CountdownTick { remaining: 1 });
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_disconnected_subscriber_dropped() {
        let mut bus = EventBus::new(4);
        let rx = bus.subscribe();
        drop(rx);
        bus.emit(EngineEvent::CountdownTick { remaining: 1 });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
