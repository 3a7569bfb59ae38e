//! WaitingEntry - a user's presence in the matching pool

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MatchMode, Snowflake, UserId};

/// A user waiting for a counterpart. At most one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitingEntry {
    pub user_id: UserId,
    pub mode: MatchMode,
    /// Tie-break for entries enqueued in the same instant
    pub ticket: Snowflake,
    pub enqueued_at: DateTime<Utc>,
}

impl WaitingEntry {
    pub fn new(user_id: UserId, mode: MatchMode, ticket: Snowflake, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            mode,
            ticket,
            enqueued_at: now,
        }
    }

    /// FIFO position: older entries sort first.
    pub fn queue_key(&self) -> (DateTime<Utc>, Snowflake) {
        (self.enqueued_at, self.ticket)
    }

    /// Whether this entry is older than `ttl` at `now`
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.enqueued_at > ttl
    }
}
