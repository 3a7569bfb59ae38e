//! Event ports - publishing and subscribing to match events

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::DomainError;
use crate::events::{EventFilter, MatchEvent};

/// Live stream of events that passed a subscription filter
pub type EventStream = BoxStream<'static, MatchEvent>;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &MatchEvent) -> Result<(), DomainError>;
}

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events published after this call returns that match `filter`
    async fn subscribe(&self, filter: EventFilter) -> Result<EventStream, DomainError>;
}
