//! Waiting entry database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for waiting_entries table
#[derive(Debug, Clone, FromRow)]
pub struct WaitingEntryModel {
    pub user_id: Uuid,
    pub mode: String,
    pub ticket: i64,
    pub enqueued_at: DateTime<Utc>,
}
