//! Redis Pub/Sub module.
//!
//! Match events fan out across API instances through Redis channels.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, PAIRING_CHANNEL_PREFIX, POOL_CHANNEL_PREFIX, USER_CHANNEL_PREFIX};
pub use publisher::RedisEventPublisher;
pub use subscriber::{RedisEventSubscriber, SubscriberConfig, SubscriberError, SubscriberResult};
