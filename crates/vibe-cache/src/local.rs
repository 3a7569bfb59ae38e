//! In-process event bus
//!
//! Used when the node runs alone (`EVENT_BACKEND=local`) and in tests.

use async_trait::async_trait;
use tokio::sync::broadcast;
use vibe_core::{DomainError, EventFilter, EventPublisher, EventSource, EventStream, MatchEvent};

#[derive(Clone)]
pub struct LocalEventBus {
    tx: broadcast::Sender<MatchEvent>,
}

impl LocalEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LocalEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventPublisher for LocalEventBus {
    async fn publish(&self, event: &MatchEvent) -> Result<(), DomainError> {
        let receivers = self.tx.send(event.clone()).unwrap_or(0);
        tracing::debug!(event_type = event.event_type(), receivers, "Published event");
        Ok(())
    }
}

#[async_trait]
impl EventSource for LocalEventBus {
    async fn subscribe(&self, filter: EventFilter) -> Result<EventStream, DomainError> {
        Ok(crate::stream::filtered(self.tx.subscribe(), filter))
    }
}
