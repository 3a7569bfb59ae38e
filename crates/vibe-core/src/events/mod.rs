//! Match events - notifications emitted when pool or pairing state changes

mod filter;
mod match_event;

pub use filter::EventFilter;
pub use match_event::{
    ConsentRecordedEvent, EarnBackOfferedEvent, MatchEvent, PairingAbandonedEvent,
    PairingCreatedEvent, PairingUnlockedEvent, PoolEnteredEvent, PoolLeftEvent,
};
