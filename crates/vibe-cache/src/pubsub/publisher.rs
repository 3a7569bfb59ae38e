//! Redis Pub/Sub publisher for match events.

use async_trait::async_trait;
use redis::AsyncCommands;
use vibe_core::{DomainError, EventPublisher, MatchEvent};

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Publishes match events as JSON on their routing channel
#[derive(Clone)]
pub struct RedisEventPublisher {
    pool: RedisPool,
}

impl RedisEventPublisher {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event, returning how many subscribers received it
    pub async fn publish_event(&self, event: &MatchEvent) -> RedisResult<u32> {
        let channel = PubSubChannel::for_event(event);
        let channel_name = channel.name();
        let payload = serde_json::to_string(event)?;

        let mut conn = self.pool.get().await?;
        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = event.event_type(),
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: &MatchEvent) -> Result<(), DomainError> {
        self.publish_event(event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RedisEventPublisher>();
    }
}
