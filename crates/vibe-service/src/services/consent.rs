//! Consent Tracker
//!
//! Drives each pairing through `active -> mutual | abandoned`. Every transition
//! is a conditional store write, so concurrent votes, skips and countdowns
//! race safely: the first transition wins and later ones are no-ops. Ledger
//! side effects carry idempotency keys and can be replayed.

use serde::Serialize;
use tracing::{debug, info, instrument};
use vibe_core::events::EarnBackOfferedEvent;
use vibe_core::{
    AbandonReason, ConsentWrite, DomainError, EarnBackOffer, LedgerAdjustment, MatchEvent,
    Pairing, PairingStatus, Snowflake, SpendOutcome, UserId,
};

use super::context::MatchContext;
use super::error::ServiceResult;

/// What a consent vote achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentOutcome {
    /// Vote recorded; waiting on the counterpart
    Pending,
    /// This side had already voted; nothing changed
    Duplicate,
    /// Both sides are in; the conversation is unlocked
    Unlocked,
    /// The pairing was already mutual before this vote
    AlreadyUnlocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteResult {
    pub pairing: Pairing,
    pub outcome: ConsentOutcome,
}

/// What leaving a pairing cost the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PenaltyOutcome {
    /// Nothing to pay: the caller did not end the pairing, or skips are free
    NotCharged,
    Charged { balance: i64 },
    /// A replay of a charge that already went through
    AlreadyCharged,
    /// Balance could not cover the cost; offered a way to earn coins instead
    EarnBack { offer: EarnBackOffer },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbandonResult {
    pub pairing: Pairing,
    pub penalty: PenaltyOutcome,
}

pub struct ConsentTracker<'a> {
    ctx: &'a MatchContext,
}

impl<'a> ConsentTracker<'a> {
    pub fn new(ctx: &'a MatchContext) -> Self {
        Self { ctx }
    }

    /// Read a pairing as one of its participants
    #[instrument(skip(self))]
    pub async fn get(&self, pairing_id: Snowflake, user_id: UserId) -> ServiceResult<Pairing> {
        let pairing = self.load(pairing_id).await?;
        if !pairing.involves(user_id) {
            return Err(DomainError::NotParticipant.into());
        }
        Ok(pairing)
    }

    /// Record `user_id`'s vote. Idempotent per side.
    #[instrument(skip(self))]
    pub async fn vote(&self, pairing_id: Snowflake, user_id: UserId) -> ServiceResult<VoteResult> {
        let pairing = self.load(pairing_id).await?;
        let side = pairing.side_of(user_id).ok_or(DomainError::NotParticipant)?;

        match pairing.status {
            PairingStatus::Mutual => return self.replay_unlock(pairing).await,
            PairingStatus::Abandoned => return Err(DomainError::PairingClosed(pairing_id).into()),
            PairingStatus::Active => {}
        }

        let now = self.ctx.now();
        if pairing.deadline_passed(now) {
            // A late vote cannot rescue the pairing; close it on the way out
            self.expire(pairing_id, None).await?;
            return Err(DomainError::PairingClosed(pairing_id).into());
        }

        let (pairing, newly_recorded) =
            match self.ctx.pairing_store().record_consent(pairing_id, side, now).await? {
                ConsentWrite::Recorded(p) => (p, true),
                ConsentWrite::AlreadyRecorded(p) => (p, false),
                ConsentWrite::Closed(p) => {
                    return match p.status {
                        PairingStatus::Mutual => self.replay_unlock(p).await,
                        _ => Err(DomainError::PairingClosed(pairing_id).into()),
                    };
                }
            };

        if newly_recorded {
            info!(pairing_id = %pairing_id, user_id = %user_id, side = ?side, "Consent recorded");
            self.ctx
                .publish(MatchEvent::consent_recorded(&pairing, user_id, now))
                .await;
        }

        if !pairing.both_consented() {
            let outcome = if newly_recorded {
                ConsentOutcome::Pending
            } else {
                ConsentOutcome::Duplicate
            };
            return Ok(VoteResult { pairing, outcome });
        }

        // Both flags set: race for the mutual transition. Exactly one caller wins it.
        match self.ctx.pairing_store().mark_mutual(pairing_id, now).await? {
            Some(unlocked) => {
                info!(
                    pairing_id = %pairing_id,
                    rtc_channel = ?unlocked.rtc_channel,
                    "Pairing unlocked"
                );
                self.ctx
                    .publish(MatchEvent::pairing_unlocked(&unlocked, now))
                    .await;
                self.settle_unlock(&unlocked).await?;
                Ok(VoteResult {
                    pairing: unlocked,
                    outcome: ConsentOutcome::Unlocked,
                })
            }
            None => {
                let current = self.load(pairing_id).await?;
                match current.status {
                    PairingStatus::Mutual => {
                        debug!(pairing_id = %pairing_id, "Mutual transition won by the other vote");
                        self.settle_unlock(&current).await?;
                        Ok(VoteResult {
                            pairing: current,
                            outcome: ConsentOutcome::Unlocked,
                        })
                    }
                    _ => Err(DomainError::PairingClosed(pairing_id).into()),
                }
            }
        }
    }

    /// Leave an active pairing early. The skipper pays the skip cost.
    #[instrument(skip(self))]
    pub async fn skip(&self, pairing_id: Snowflake, user_id: UserId) -> ServiceResult<AbandonResult> {
        let pairing = self.load(pairing_id).await?;
        if !pairing.involves(user_id) {
            return Err(DomainError::NotParticipant.into());
        }
        if pairing.status == PairingStatus::Mutual {
            return Err(DomainError::PairingClosed(pairing_id).into());
        }

        self.abandon(pairing, AbandonReason::Skipped, Some(user_id))
            .await
    }

    /// Close an active pairing whose countdown ran out.
    ///
    /// `triggered_by` is the participant whose client countdown fired; that
    /// participant pays the skip cost at most once, whether their call closes
    /// the pairing or finds it already timed out. The server sweeper passes
    /// `None` and charges nobody.
    #[instrument(skip(self))]
    pub async fn expire(
        &self,
        pairing_id: Snowflake,
        triggered_by: Option<UserId>,
    ) -> ServiceResult<AbandonResult> {
        let pairing = self.load(pairing_id).await?;
        if let Some(user_id) = triggered_by {
            if !pairing.involves(user_id) {
                return Err(DomainError::NotParticipant.into());
            }
        }
        if pairing.is_active() && !pairing.deadline_passed(self.ctx.now()) {
            return Err(DomainError::DeadlineNotReached(pairing_id).into());
        }

        self.abandon(pairing, AbandonReason::TimedOut, triggered_by)
            .await
    }

    /// Conditional `active -> abandoned`, then the penalty for the caller.
    async fn abandon(
        &self,
        pairing: Pairing,
        reason: AbandonReason,
        closed_by: Option<UserId>,
    ) -> ServiceResult<AbandonResult> {
        let pairing_id = pairing.id;

        if pairing.is_active() {
            let now = self.ctx.now();
            if let Some(closed) = self
                .ctx
                .pairing_store()
                .mark_abandoned(pairing_id, reason, closed_by, now)
                .await?
            {
                info!(
                    pairing_id = %pairing_id,
                    reason = reason.as_str(),
                    closed_by = ?closed_by,
                    "Pairing abandoned"
                );
                self.ctx
                    .publish(MatchEvent::pairing_abandoned(&closed, now))
                    .await;
                let penalty = match closed_by {
                    Some(user_id) => self.charge_penalty(&closed, user_id).await?,
                    None => PenaltyOutcome::NotCharged,
                };
                return Ok(AbandonResult {
                    pairing: closed,
                    penalty,
                });
            }
            debug!(pairing_id = %pairing_id, "Abandon lost to another transition");
        }

        let current = self.load(pairing_id).await?;
        if current.status == PairingStatus::Mutual && reason == AbandonReason::Skipped {
            return Err(DomainError::PairingClosed(pairing_id).into());
        }

        // Every countdown that fires on a timed-out pairing charges its own
        // client. A skip only rolls forward the skipper's earlier charge.
        let penalty = match closed_by {
            Some(user_id)
                if current.status == PairingStatus::Abandoned
                    && (current.closed_by == Some(user_id)
                        || (reason == AbandonReason::TimedOut
                            && current.end_reason == Some(AbandonReason::TimedOut))) =>
            {
                self.charge_penalty(&current, user_id).await?
            }
            _ => PenaltyOutcome::NotCharged,
        };

        Ok(AbandonResult {
            pairing: current,
            penalty,
        })
    }

    /// Grant the unlock reward to both participants. Safe to replay.
    #[instrument(skip(self, pairing), fields(pairing_id = %pairing.id))]
    pub async fn settle_unlock(&self, pairing: &Pairing) -> ServiceResult<()> {
        let xp = self.ctx.settings().unlock_xp;
        if xp == 0 {
            return Ok(());
        }
        for user_id in pairing.participants() {
            let receipt = self
                .ctx
                .ledger()
                .adjust(&LedgerAdjustment::unlock_reward(pairing.id, user_id, xp))
                .await?;
            if receipt.applied {
                info!(user_id = %user_id, xp, balance = receipt.balance, "Unlock reward granted");
            } else {
                debug!(user_id = %user_id, "Unlock reward already granted");
            }
        }
        Ok(())
    }

    async fn replay_unlock(&self, pairing: Pairing) -> ServiceResult<VoteResult> {
        let stale = DomainError::StaleUnlockAttempt(pairing.id);
        debug!(code = stale.code(), pairing_id = %pairing.id, "Vote on unlocked pairing");
        self.settle_unlock(&pairing).await?;
        Ok(VoteResult {
            pairing,
            outcome: ConsentOutcome::AlreadyUnlocked,
        })
    }

    /// Charge the skip cost, or offer an earn-back when the balance is short
    async fn charge_penalty(&self, pairing: &Pairing, user_id: UserId) -> ServiceResult<PenaltyOutcome> {
        let settings = self.ctx.settings();
        if settings.skip_cost == 0 {
            return Ok(PenaltyOutcome::NotCharged);
        }

        let adjustment = LedgerAdjustment::skip_penalty(pairing.id, user_id, settings.skip_cost);
        match self.ctx.ledger().spend_if_available(&adjustment).await? {
            SpendOutcome::Spent { balance } => {
                info!(user_id = %user_id, cost = settings.skip_cost, balance, "Skip cost charged");
                Ok(PenaltyOutcome::Charged { balance })
            }
            SpendOutcome::Duplicate => Ok(PenaltyOutcome::AlreadyCharged),
            SpendOutcome::Insufficient { balance } => {
                info!(user_id = %user_id, balance, "Balance too low for skip, offering earn-back");
                let offer = EarnBackOffer::watch_ad(user_id, settings.earn_back_reward);
                self.ctx
                    .publish(MatchEvent::EarnBackOffered(EarnBackOfferedEvent {
                        pairing_id: pairing.id,
                        user_id,
                        coins: offer.coins,
                        action: offer.action.clone(),
                        timestamp: self.ctx.now(),
                    }))
                    .await;
                Ok(PenaltyOutcome::EarnBack { offer })
            }
        }
    }

    async fn load(&self, pairing_id: Snowflake) -> ServiceResult<Pairing> {
        Ok(self
            .ctx
            .pairing_store()
            .find_by_id(pairing_id)
            .await?
            .ok_or(DomainError::PairingNotFound(pairing_id))?)
    }
}
