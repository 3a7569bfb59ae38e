//! # vibe-core
//!
//! Domain layer for the mutual-match rendezvous: waiting entries, pairings,
//! ledger adjustments, match events and the store ports the coordinator runs on.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AbandonReason, ConsentWrite, EarnBackOffer, LedgerAdjustment, LedgerKind, LedgerReceipt,
    Pairing, PairingStatus, Side, SpendOutcome, WaitingEntry,
};
pub use error::DomainError;
pub use events::{EventFilter, MatchEvent};
pub use traits::{
    Clock, EventPublisher, EventSource, EventStream, Ledger, ManualClock, PairingStore,
    RepoResult, SystemClock, WaitingPoolStore,
};
pub use value_objects::{MatchMode, Snowflake, SnowflakeGenerator, SnowflakeParseError, UserId};
