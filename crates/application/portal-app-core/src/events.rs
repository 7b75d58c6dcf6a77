use tokio::sync::broadcast;

use crate::audio::Gesture;
use crate::engine::{PlayOutcome, RunId};

/// Signals for overlay renderers and other observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SequenceStarted {
        run_id: RunId,
        name: String,
    },
    PhaseChanged {
        run_id: RunId,
        phase: String,
    },
    SequenceFinished {
        run_id: RunId,
        name: String,
        outcome: PlayOutcome,
    },
    CancelRefused {
        run_id: RunId,
        name: String,
    },
    NavigationStarted {
        from: Option<String>,
        route: String,
        animation: Option<String>,
        blocking: bool,
    },
    NavigationCompleted {
        route: String,
    },
    NavigationDropped {
        route: String,
    },
    AudioUnlocked {
        gesture: Gesture,
    },
}

/// Broadcast fan-out of [`EngineEvent`]s. Slow subscribers lag, publishers never block.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: EngineEvent) {
        // No subscribers is the normal headless case.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(portal_config::EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        bus.publish(EngineEvent::NavigationCompleted { route: "/".into() });
    }

    #[test]
    fn every_subscriber_sees_each_event() {
        let bus = EventBus::new(4);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(EngineEvent::NavigationDropped { route: "/team".into() });
        let expected = EngineEvent::NavigationDropped { route: "/team".into() };
        assert_eq!(a.try_recv().unwrap(), expected);
        assert_eq!(b.try_recv().unwrap(), expected);
    }
}
