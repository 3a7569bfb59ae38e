//! Match context - dependency container for the matchmaking services
//!
//! Holds the store ports, the event transport, the clock and the id generator.

use std::sync::Arc;

use vibe_common::MatchSettings;
use vibe_core::{
    Clock, EventPublisher, EventSource, Ledger, MatchEvent, PairingStore, Snowflake,
    SnowflakeGenerator, SystemClock, WaitingPoolStore,
};

use super::error::{ServiceError, ServiceResult};

/// Everything the coordinator touches. Clones share the same ports.
#[derive(Clone)]
pub struct MatchContext {
    // Stores
    pool_store: Arc<dyn WaitingPoolStore>,
    pairing_store: Arc<dyn PairingStore>,
    ledger: Arc<dyn Ledger>,

    // Events
    publisher: Arc<dyn EventPublisher>,
    events: Arc<dyn EventSource>,

    clock: Arc<dyn Clock>,
    snowflake_generator: Arc<SnowflakeGenerator>,
    settings: Arc<MatchSettings>,
}

impl MatchContext {
    pub fn builder() -> MatchContextBuilder {
        MatchContextBuilder::new()
    }

    // === Stores ===

    pub fn pool_store(&self) -> &dyn WaitingPoolStore {
        self.pool_store.as_ref()
    }

    pub fn pairing_store(&self) -> &dyn PairingStore {
        self.pairing_store.as_ref()
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    // === Events ===

    pub fn events(&self) -> &dyn EventSource {
        self.events.as_ref()
    }

    /// Publish an event. Failures are logged and swallowed: the store is
    /// authoritative and clients can always re-read their status.
    pub async fn publish(&self, event: MatchEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            tracing::warn!(
                error = %e,
                event_type = event.event_type(),
                "Failed to publish match event"
            );
        }
    }

    // === Misc ===

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }
}

impl std::fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("stores", &"...")
            .field("events", &"...")
            .field("worker_id", &self.snowflake_generator.worker_id())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for [`MatchContext`]. Stores and the event transport are required;
/// the clock defaults to wall time and the generator to worker 0.
#[derive(Default)]
pub struct MatchContextBuilder {
    pool_store: Option<Arc<dyn WaitingPoolStore>>,
    pairing_store: Option<Arc<dyn PairingStore>>,
    ledger: Option<Arc<dyn Ledger>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    events: Option<Arc<dyn EventSource>>,
    clock: Option<Arc<dyn Clock>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    settings: Option<MatchSettings>,
}

impl MatchContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool_store(mut self, store: Arc<dyn WaitingPoolStore>) -> Self {
        self.pool_store = Some(store);
        self
    }

    pub fn pairing_store(mut self, store: Arc<dyn PairingStore>) -> Self {
        self.pairing_store = Some(store);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSource>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn settings(mut self, settings: MatchSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the context
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a required dependency is missing
    /// or the settings would stall matching
    pub fn build(self) -> ServiceResult<MatchContext> {
        let settings = self.settings.unwrap_or_default();
        settings
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        Ok(MatchContext {
            pool_store: self
                .pool_store
                .ok_or_else(|| ServiceError::validation("pool_store is required"))?,
            pairing_store: self
                .pairing_store
                .ok_or_else(|| ServiceError::validation("pairing_store is required"))?,
            ledger: self
                .ledger
                .ok_or_else(|| ServiceError::validation("ledger is required"))?,
            publisher: self
                .publisher
                .ok_or_else(|| ServiceError::validation("publisher is required"))?,
            events: self
                .events
                .ok_or_else(|| ServiceError::validation("events is required"))?,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            snowflake_generator: self
                .snowflake_generator
                .unwrap_or_else(|| Arc::new(SnowflakeGenerator::default())),
            settings: Arc::new(settings),
        })
    }
}
