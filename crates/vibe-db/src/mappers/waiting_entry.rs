//! WaitingEntry <-> model mapper

use vibe_core::{DomainError, Snowflake, UserId, WaitingEntry};

use super::parse_mode;
use crate::models::WaitingEntryModel;

impl TryFrom<WaitingEntryModel> for WaitingEntry {
    type Error = DomainError;

    fn try_from(model: WaitingEntryModel) -> Result<Self, Self::Error> {
        Ok(WaitingEntry {
            user_id: UserId::from_uuid(model.user_id),
            mode: parse_mode(&model.mode)?,
            ticket: Snowflake::new(model.ticket),
            enqueued_at: model.enqueued_at,
        })
    }
}
