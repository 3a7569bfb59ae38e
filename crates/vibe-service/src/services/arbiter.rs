//! Pairing Arbiter
//!
//! Claims the oldest compatible waiter and creates the pairing in one atomic
//! store step. Losing a race to another arbiter pass is retried against a
//! fresh pool read and, past the attempt bound, degrades to "stay waiting".

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, instrument};
use vibe_core::{DomainError, MatchEvent, MatchMode, Pairing, UserId};

use super::context::MatchContext;
use super::error::ServiceResult;
use super::pool::PoolManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PairOutcome {
    Paired { pairing: Pairing },
    /// Nobody to pair with right now; keep waiting
    NoCandidate,
}

pub struct PairingArbiter<'a> {
    ctx: &'a MatchContext,
}

impl<'a> PairingArbiter<'a> {
    pub fn new(ctx: &'a MatchContext) -> Self {
        Self { ctx }
    }

    /// One arbiter pass for a user already in the pool
    #[instrument(skip(self))]
    pub async fn attempt_pair(&self, user_id: UserId, mode: MatchMode) -> ServiceResult<PairOutcome> {
        let pool = PoolManager::new(self.ctx);
        let max_attempts = self.ctx.settings().max_pair_attempts;

        for attempt in 1..=max_attempts {
            let Some(own) = self.ctx.pool_store().find(user_id).await? else {
                // Someone else's pass may have claimed us already
                return self.existing_pairing(user_id).await;
            };
            if own.mode != mode {
                debug!(user_id = %user_id, queued_mode = %own.mode, "Queued for another mode");
                return Ok(PairOutcome::NoCandidate);
            }

            let Some(candidate) = pool.find_candidate(mode, user_id).await? else {
                return Ok(PairOutcome::NoCandidate);
            };

            let now = self.ctx.now();
            let pairing = Pairing::new(
                self.ctx.generate_id(),
                candidate.user_id,
                user_id,
                mode,
                now,
                self.ctx.settings().decision_window(),
            );

            match self.ctx.pairing_store().create_and_drain(&pairing).await {
                Ok(()) => {
                    info!(
                        pairing_id = %pairing.id,
                        participant_a = %pairing.participant_a,
                        participant_b = %pairing.participant_b,
                        mode = %mode,
                        deadline = %pairing.decision_deadline,
                        "Pairing created"
                    );
                    self.ctx.publish(MatchEvent::pairing_created(&pairing)).await;
                    return Ok(PairOutcome::Paired { pairing });
                }
                Err(DomainError::PairingConflict) => {
                    debug!(
                        user_id = %user_id,
                        candidate = %candidate.user_id,
                        attempt,
                        "Lost pairing race, retrying"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(user_id = %user_id, "Pair attempts exhausted, staying in pool");
        self.existing_pairing(user_id).await
    }

    async fn existing_pairing(&self, user_id: UserId) -> ServiceResult<PairOutcome> {
        Ok(match self.ctx.pairing_store().find_active_for_user(user_id).await? {
            Some(pairing) => PairOutcome::Paired { pairing },
            None => PairOutcome::NoCandidate,
        })
    }

    /// Linear backoff with up to one extra step of jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let step = self.ctx.settings().pair_backoff();
        let jitter_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms));
        step * attempt + jitter
    }
}
