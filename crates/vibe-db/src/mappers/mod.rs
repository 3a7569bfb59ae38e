//! Entity <-> Model mappers
//!
//! Text columns are checked constraints in the schema, so a value that does not
//! parse means the row was written by something else and surfaces as a
//! database error rather than a panic.

mod pairing;
mod waiting_entry;

use vibe_core::{DomainError, MatchMode};

pub(crate) fn parse_mode(raw: &str) -> Result<MatchMode, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::DatabaseError(format!("unknown mode in row: {raw}")))
}
