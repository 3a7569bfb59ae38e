//! Match coordinator - the entry points the API calls
//!
//! Composes the pool, the arbiter and the consent tracker into the request
//! flow: enqueue, one arbiter pass, then either paired or waiting.

use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, instrument};
use vibe_core::{DomainError, EventFilter, MatchEvent, MatchMode, Pairing, Snowflake, UserId, WaitingEntry};

use super::arbiter::{PairOutcome, PairingArbiter};
use super::consent::{AbandonResult, ConsentTracker, VoteResult};
use super::context::MatchContext;
use super::error::ServiceResult;
use super::pool::{already_paired, MatchStatus, PoolManager};

/// Enqueue attempts before giving up on a pairing that keeps closing under us
const ENQUEUE_ATTEMPTS: usize = 2;

pub struct MatchCoordinator<'a> {
    ctx: &'a MatchContext,
}

impl<'a> MatchCoordinator<'a> {
    pub fn new(ctx: &'a MatchContext) -> Self {
        Self { ctx }
    }

    /// Ask for a counterpart in `mode`.
    ///
    /// Returns `Paired` when this pass (or an earlier one) produced a pairing,
    /// `Waiting` when the user now sits in the pool.
    #[instrument(skip(self))]
    pub async fn request_match(&self, user_id: UserId, mode: MatchMode) -> ServiceResult<MatchStatus> {
        let pool = PoolManager::new(self.ctx);

        let mut attempts = 0;
        let entry = loop {
            attempts += 1;
            match pool.enqueue(user_id, mode).await {
                Ok(entry) => break entry,
                Err(err) => {
                    let Some(pairing_id) = already_paired(&err) else {
                        return Err(err);
                    };
                    if let Some(pairing) = self.active_pairing(pairing_id).await? {
                        debug!(user_id = %user_id, pairing_id = %pairing_id, "Routing into existing pairing");
                        return Ok(MatchStatus::Paired { pairing });
                    }
                    // It closed between the two reads; the next enqueue will go through
                    if attempts >= ENQUEUE_ATTEMPTS {
                        return Err(err);
                    }
                }
            }
        };

        match PairingArbiter::new(self.ctx).attempt_pair(user_id, mode).await? {
            PairOutcome::Paired { pairing } => Ok(MatchStatus::Paired { pairing }),
            PairOutcome::NoCandidate => Ok(MatchStatus::Waiting { entry }),
        }
    }

    /// Stop searching. Idempotent.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: UserId) -> ServiceResult<Option<WaitingEntry>> {
        PoolManager::new(self.ctx).dequeue(user_id).await
    }

    pub async fn status(&self, user_id: UserId) -> ServiceResult<MatchStatus> {
        PoolManager::new(self.ctx).status(user_id).await
    }

    /// Passive wait for another client's arbiter pass to pair this user.
    ///
    /// Subscribes before re-reading the store so a pairing formed in between
    /// is not missed. Returns `None` on timeout or when the user is no longer
    /// waiting.
    #[instrument(skip(self))]
    pub async fn wait_for_pairing(
        &self,
        user_id: UserId,
        timeout: Duration,
    ) -> ServiceResult<Option<Pairing>> {
        let mut events = self.ctx.events().subscribe(EventFilter::User(user_id)).await?;

        match self.status(user_id).await? {
            MatchStatus::Paired { pairing } => return Ok(Some(pairing)),
            MatchStatus::Idle => return Ok(None),
            MatchStatus::Waiting { .. } => {}
        }

        let created = tokio::time::timeout(timeout, async {
            while let Some(event) = events.next().await {
                if let MatchEvent::PairingCreated(e) = event {
                    return Some(e.pairing_id);
                }
            }
            None
        })
        .await
        .ok()
        .flatten();

        match created {
            Some(pairing_id) => Ok(self.ctx.pairing_store().find_by_id(pairing_id).await?),
            None => {
                // The stream may have lagged past the event
                match self.status(user_id).await? {
                    MatchStatus::Paired { pairing } => Ok(Some(pairing)),
                    _ => Ok(None),
                }
            }
        }
    }

    pub async fn get_pairing(&self, pairing_id: Snowflake, user_id: UserId) -> ServiceResult<Pairing> {
        ConsentTracker::new(self.ctx).get(pairing_id, user_id).await
    }

    pub async fn vote(&self, pairing_id: Snowflake, user_id: UserId) -> ServiceResult<VoteResult> {
        ConsentTracker::new(self.ctx).vote(pairing_id, user_id).await
    }

    pub async fn skip(&self, pairing_id: Snowflake, user_id: UserId) -> ServiceResult<AbandonResult> {
        ConsentTracker::new(self.ctx).skip(pairing_id, user_id).await
    }

    /// A participant's countdown fired
    pub async fn expire(&self, pairing_id: Snowflake, user_id: UserId) -> ServiceResult<AbandonResult> {
        ConsentTracker::new(self.ctx)
            .expire(pairing_id, Some(user_id))
            .await
    }

    async fn active_pairing(&self, pairing_id: Snowflake) -> ServiceResult<Option<Pairing>> {
        let pairing = self
            .ctx
            .pairing_store()
            .find_by_id(pairing_id)
            .await?
            .ok_or(DomainError::PairingNotFound(pairing_id))?;
        Ok(pairing.is_active().then_some(pairing))
    }
}
