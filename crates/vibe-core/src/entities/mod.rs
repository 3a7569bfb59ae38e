//! Domain entities - pool entries, pairings and ledger records

mod ledger;
mod pairing;
mod waiting_entry;

pub use ledger::{EarnBackOffer, LedgerAdjustment, LedgerKind, LedgerReceipt, SpendOutcome};
pub use pairing::{AbandonReason, ConsentWrite, Pairing, PairingStatus, Side};
pub use waiting_entry::WaitingEntry;
