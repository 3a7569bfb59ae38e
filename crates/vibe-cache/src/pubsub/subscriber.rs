//! Redis Pub/Sub subscriber.
//!
//! One background connection pattern-subscribes to every match channel and
//! re-broadcasts decoded events to in-process subscribers, which filter locally.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::Client;
use tokio::sync::{broadcast, mpsc};
use vibe_core::{DomainError, EventFilter, EventSource, EventStream, MatchEvent};

use crate::pool::redact_url;
use crate::pubsub::PubSubChannel;

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// Channel buffer size for broadcast
    pub broadcast_buffer: usize,
    /// Reconnection delay in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay_ms: 1000,
        }
    }
}

impl From<&vibe_common::RedisConfig> for SubscriberConfig {
    fn from(config: &vibe_common::RedisConfig) -> Self {
        Self {
            redis_url: config.url.clone(),
            ..Self::default()
        }
    }
}

/// Redis-backed event source
pub struct RedisEventSubscriber {
    broadcast_tx: broadcast::Sender<MatchEvent>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RedisEventSubscriber {
    /// Spawn the background listener and return a handle to it
    #[must_use]
    pub fn start(config: SubscriberConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::listener_loop(config, broadcast_tx.clone(), shutdown_rx));

        Self {
            broadcast_tx,
            shutdown_tx,
        }
    }

    async fn listener_loop(
        config: SubscriberConfig,
        broadcast_tx: broadcast::Sender<MatchEvent>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        loop {
            match Self::run_listener(&config, &broadcast_tx, &mut shutdown_rx).await {
                Ok(()) => {
                    tracing::info!("Subscriber shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Subscriber error, reconnecting...");
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        config.reconnect_delay_ms,
                    ))
                    .await;
                }
            }
        }
    }

    /// Run the listener until error or shutdown
    async fn run_listener(
        config: &SubscriberConfig,
        broadcast_tx: &broadcast::Sender<MatchEvent>,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) -> SubscriberResult<()> {
        let client = Client::open(config.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;

        for pattern in PubSubChannel::patterns() {
            pubsub.psubscribe(&pattern).await?;
        }

        tracing::info!(url = %redact_url(&config.redis_url), "Subscriber connected to Redis");

        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        return Err(SubscriberError::ChannelClosed);
                    };
                    let channel = msg.get_channel_name().to_string();
                    let payload: String = msg.get_payload().unwrap_or_default();

                    match serde_json::from_str::<MatchEvent>(&payload) {
                        Ok(event) => {
                            tracing::trace!(channel = %channel, event_type = event.event_type(), "Received event");
                            // No receivers is fine
                            let _ = broadcast_tx.send(event);
                        }
                        Err(e) => {
                            tracing::warn!(channel = %channel, error = %e, "Dropping undecodable event");
                        }
                    }
                }

                _ = shutdown_rx.recv() => return Ok(()),
            }
        }
    }

    /// Stop the background listener
    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SubscriberError::ChannelClosed)
    }
}

#[async_trait]
impl EventSource for RedisEventSubscriber {
    async fn subscribe(&self, filter: EventFilter) -> Result<EventStream, DomainError> {
        Ok(crate::stream::filtered(self.broadcast_tx.subscribe(), filter))
    }
}
