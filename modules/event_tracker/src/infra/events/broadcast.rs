use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::{events::EventDomainEvent, ports::EventPublisher};

/// Fans domain events out to in-process subscribers.
/// Bounded: slow subscribers lose the oldest events instead of blocking writers.
#[derive(Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<EventDomainEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventDomainEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventPublisher<EventDomainEvent> for BroadcastPublisher {
    fn publish(&self, event: &EventDomainEvent) {
        // Err only means nobody is listening.
        if self.tx.send(event.clone()).is_err() {
            trace!("no subscribers for domain event");
        }
    }
}
