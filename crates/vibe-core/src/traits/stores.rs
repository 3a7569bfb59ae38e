//! Store traits (ports) - define the interface for data access
//!
//! Every mutating method is a single conditional operation in the backing
//! store. Callers never read-then-write across two calls to enforce an
//! invariant; implementations must make each call atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    AbandonReason, ConsentWrite, LedgerAdjustment, LedgerKind, LedgerReceipt, Pairing, Side,
    SpendOutcome, WaitingEntry,
};
use crate::error::DomainError;
use crate::value_objects::{MatchMode, Snowflake, UserId};

/// Result type for store operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Waiting Pool
// ============================================================================

#[async_trait]
pub trait WaitingPoolStore: Send + Sync {
    /// Insert or replace the user's entry.
    ///
    /// Fails with [`DomainError::AlreadyPaired`] when the user has an active
    /// pairing; the check and the write are one atomic step. Returns the
    /// entry that was replaced, if any.
    async fn upsert(&self, entry: &WaitingEntry) -> RepoResult<Option<WaitingEntry>>;

    /// Remove the user's entry. Returns the removed entry; absent is not an error.
    async fn remove(&self, user_id: UserId) -> RepoResult<Option<WaitingEntry>>;

    async fn find(&self, user_id: UserId) -> RepoResult<Option<WaitingEntry>>;

    /// Oldest entry for `mode` that does not belong to `excluding`
    async fn find_candidate(
        &self,
        mode: MatchMode,
        excluding: UserId,
    ) -> RepoResult<Option<WaitingEntry>>;

    /// Oldest-first snapshot of a mode's pool
    async fn list(&self, mode: MatchMode, limit: i64) -> RepoResult<Vec<WaitingEntry>>;

    /// Remove every entry enqueued before `cutoff`, returning what was removed
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<WaitingEntry>>;
}

// ============================================================================
// Pairings
// ============================================================================

#[async_trait]
pub trait PairingStore: Send + Sync {
    /// Persist `pairing` and delete both participants' waiting entries, or do nothing.
    ///
    /// Fails with [`DomainError::PairingConflict`] unless both entries still
    /// exist for `pairing.mode` and neither participant has an active pairing.
    async fn create_and_drain(&self, pairing: &Pairing) -> RepoResult<()>;

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Pairing>>;

    /// The user's active pairing, if any
    async fn find_active_for_user(&self, user_id: UserId) -> RepoResult<Option<Pairing>>;

    /// Set one side's consent flag if the pairing is active and the flag unset.
    /// Fails with [`DomainError::PairingNotFound`] for an unknown id.
    async fn record_consent(
        &self,
        id: Snowflake,
        side: Side,
        now: DateTime<Utc>,
    ) -> RepoResult<ConsentWrite>;

    /// `active -> mutual` when both flags are set. `Some` only for the call that won.
    async fn mark_mutual(&self, id: Snowflake, now: DateTime<Utc>) -> RepoResult<Option<Pairing>>;

    /// `active -> abandoned`. `Some` only for the call that won. A timeout is
    /// refused while `now` is before the decision deadline.
    async fn mark_abandoned(
        &self,
        id: Snowflake,
        reason: AbandonReason,
        closed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Pairing>>;

    /// Active pairings whose deadline is at or before `cutoff`
    async fn find_expired(&self, cutoff: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Pairing>>;
}

// ============================================================================
// Ledger
// ============================================================================

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Apply a signed adjustment once per idempotency key
    async fn adjust(&self, adjustment: &LedgerAdjustment) -> RepoResult<LedgerReceipt>;

    /// Apply a debit only if the balance covers it. `adjustment.amount` is negative.
    async fn spend_if_available(&self, adjustment: &LedgerAdjustment) -> RepoResult<SpendOutcome>;

    async fn balance(&self, user_id: UserId, kind: LedgerKind) -> RepoResult<i64>;
}
