//! Pool Manager
//!
//! Tracks who is waiting for a counterpart in each mode.

use serde::Serialize;
use tracing::{debug, info, instrument};
use vibe_core::events::{PoolEnteredEvent, PoolLeftEvent};
use vibe_core::{DomainError, MatchEvent, MatchMode, Pairing, UserId, WaitingEntry};

use super::context::MatchContext;
use super::error::{ServiceError, ServiceResult};

/// Largest pool snapshot a caller may ask for
pub const MAX_LIST_LIMIT: i64 = 100;

/// Where a user stands in the matching flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchStatus {
    Idle,
    Waiting { entry: WaitingEntry },
    Paired { pairing: Pairing },
}

pub struct PoolManager<'a> {
    ctx: &'a MatchContext,
}

impl<'a> PoolManager<'a> {
    pub fn new(ctx: &'a MatchContext) -> Self {
        Self { ctx }
    }

    /// Insert or replace the user's waiting entry.
    ///
    /// Fails with [`DomainError::AlreadyPaired`] while the user sits in an active pairing.
    #[instrument(skip(self))]
    pub async fn enqueue(&self, user_id: UserId, mode: MatchMode) -> ServiceResult<WaitingEntry> {
        let entry = WaitingEntry::new(user_id, mode, self.ctx.generate_id(), self.ctx.now());
        let replaced = self.ctx.pool_store().upsert(&entry).await?;

        if let Some(old) = replaced {
            debug!(user_id = %user_id, old_mode = %old.mode, "Replaced waiting entry");
            if old.mode != mode {
                self.publish_left(&old).await;
            }
        }

        info!(user_id = %user_id, mode = %mode, ticket = %entry.ticket, "Entered pool");
        self.ctx
            .publish(MatchEvent::PoolEntered(PoolEnteredEvent {
                user_id,
                mode,
                ticket: entry.ticket,
                timestamp: entry.enqueued_at,
            }))
            .await;

        Ok(entry)
    }

    /// Remove the user's entry. Absent entries are not an error.
    #[instrument(skip(self))]
    pub async fn dequeue(&self, user_id: UserId) -> ServiceResult<Option<WaitingEntry>> {
        let removed = self.ctx.pool_store().remove(user_id).await?;
        if let Some(entry) = &removed {
            info!(user_id = %user_id, mode = %entry.mode, "Left pool");
            self.publish_left(entry).await;
        }
        Ok(removed)
    }

    /// Oldest other waiter for `mode`
    #[instrument(skip(self))]
    pub async fn find_candidate(
        &self,
        mode: MatchMode,
        excluding: UserId,
    ) -> ServiceResult<Option<WaitingEntry>> {
        Ok(self.ctx.pool_store().find_candidate(mode, excluding).await?)
    }

    #[instrument(skip(self))]
    pub async fn status(&self, user_id: UserId) -> ServiceResult<MatchStatus> {
        // Pool first: a pairing drains the entry, so the reverse order could
        // miss a pairing formed between the two reads.
        if let Some(entry) = self.ctx.pool_store().find(user_id).await? {
            return Ok(MatchStatus::Waiting { entry });
        }
        match self.ctx.pairing_store().find_active_for_user(user_id).await? {
            Some(pairing) => Ok(MatchStatus::Paired { pairing }),
            None => Ok(MatchStatus::Idle),
        }
    }

    /// Oldest-first snapshot of one mode's pool
    #[instrument(skip(self))]
    pub async fn list(&self, mode: MatchMode, limit: i64) -> ServiceResult<Vec<WaitingEntry>> {
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(ServiceError::validation(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            )));
        }
        Ok(self.ctx.pool_store().list(mode, limit).await?)
    }

    /// Drop entries older than the pool TTL
    #[instrument(skip(self))]
    pub async fn purge_stale(&self) -> ServiceResult<Vec<WaitingEntry>> {
        let cutoff = self.ctx.now() - self.ctx.settings().pool_entry_ttl();
        let purged = self.ctx.pool_store().purge_older_than(cutoff).await?;
        for entry in &purged {
            info!(user_id = %entry.user_id, mode = %entry.mode, "Purged stale waiting entry");
            self.publish_left(entry).await;
        }
        Ok(purged)
    }

    async fn publish_left(&self, entry: &WaitingEntry) {
        self.ctx
            .publish(MatchEvent::PoolLeft(PoolLeftEvent {
                user_id: entry.user_id,
                mode: entry.mode,
                timestamp: self.ctx.now(),
            }))
            .await;
    }
}

/// Whether an error is the "already paired" recovery path
pub(crate) fn already_paired(err: &ServiceError) -> Option<vibe_core::Snowflake> {
    match err.as_domain() {
        Some(DomainError::AlreadyPaired(id)) => Some(*id),
        _ => None,
    }
}
