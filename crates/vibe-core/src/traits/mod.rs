//! Ports - what the coordinator needs from storage, eventing and time

mod clock;
mod events;
mod stores;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventPublisher, EventSource, EventStream};
pub use stores::{Ledger, PairingStore, RepoResult, WaitingPoolStore};
