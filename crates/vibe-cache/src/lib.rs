//! # vibe-cache
//!
//! Event transport for match events.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Match events fan out across API instances through Redis channels
//! - **Local Bus**: In-process broadcast bus for single-node deployments and tests
//!
//! ## Example
//!
//! ```ignore
//! use vibe_cache::{RedisPool, RedisPoolConfig, RedisEventPublisher, RedisEventSubscriber};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = RedisEventPublisher::new(pool.clone());
//! let subscriber = RedisEventSubscriber::start(SubscriberConfig::default());
//!
//! let mut events = subscriber.subscribe(EventFilter::User(user_id)).await?;
//! publisher.publish(&event).await?;
//! ```

pub mod local;
pub mod pool;
pub mod pubsub;
mod stream;

pub use local::LocalEventBus;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export pubsub types
pub use pubsub::{
    PubSubChannel, RedisEventPublisher, RedisEventSubscriber, SubscriberConfig, SubscriberError,
    SubscriberResult, PAIRING_CHANNEL_PREFIX, POOL_CHANNEL_PREFIX, USER_CHANNEL_PREFIX,
};
