//! Database models - SQLx-compatible structs for PostgreSQL tables

mod pairing;
mod waiting_entry;

pub use pairing::PairingModel;
pub use waiting_entry::WaitingEntryModel;
