//! PostgreSQL store implementations

mod error;
mod ledger;
mod locks;
mod pairing;
mod waiting_pool;

pub use error::{map_db_error, map_unique_violation};
pub use ledger::PgLedger;
pub use pairing::PgPairingStore;
pub use waiting_pool::PgWaitingPoolStore;
