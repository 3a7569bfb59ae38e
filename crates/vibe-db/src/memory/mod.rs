//! In-process store implementing every matchmaking port
//!
//! All state sits behind one mutex and every port method is a single critical
//! section, so each call is atomic exactly like its PostgreSQL counterpart.
//! Simulated clients share nothing but this store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, instrument};

use vibe_core::{
    AbandonReason, ConsentWrite, DomainError, Ledger, LedgerAdjustment, LedgerKind, LedgerReceipt,
    MatchMode, Pairing, PairingStore, RepoResult, Side, Snowflake, SpendOutcome, UserId,
    WaitingEntry, WaitingPoolStore,
};

#[derive(Debug, Default)]
struct State {
    waiting: HashMap<UserId, WaitingEntry>,
    pairings: HashMap<Snowflake, Pairing>,
    /// user -> active pairing
    active: HashMap<UserId, Snowflake>,
    balances: HashMap<(UserId, LedgerKind), i64>,
    applied_keys: HashSet<String>,
}

impl State {
    fn release(&mut self, pairing: &Pairing) {
        for user in pairing.participants() {
            if self.active.get(&user) == Some(&pairing.id) {
                self.active.remove(&user);
            }
        }
    }

    fn sorted_pool(&self, mode: MatchMode) -> Vec<&WaitingEntry> {
        let mut entries: Vec<_> = self.waiting.values().filter(|e| e.mode == mode).collect();
        entries.sort_by_key(|e| e.queue_key());
        entries
    }
}

#[derive(Debug)]
pub struct MemoryMatchStore {
    state: Mutex<State>,
    available: AtomicBool,
}

impl Default for MemoryMatchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backing store going away; every call then fails with
    /// [`DomainError::StorageUnavailable`] until it is switched back on.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Set a balance directly, bypassing the journal
    pub fn seed_balance(&self, user_id: UserId, kind: LedgerKind, amount: i64) {
        self.state.lock().balances.insert((user_id, kind), amount);
    }

    pub fn waiting_count(&self) -> usize {
        self.state.lock().waiting.len()
    }

    pub fn pairing_count(&self) -> usize {
        self.state.lock().pairings.len()
    }

    fn ensure_available(&self) -> RepoResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DomainError::StorageUnavailable(
                "memory store switched off".to_string(),
            ))
        }
    }
}

// ============================================================================
// Waiting Pool
// ============================================================================

#[async_trait]
impl WaitingPoolStore for MemoryMatchStore {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id))]
    async fn upsert(&self, entry: &WaitingEntry) -> RepoResult<Option<WaitingEntry>> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        if let Some(pairing_id) = state.active.get(&entry.user_id) {
            return Err(DomainError::AlreadyPaired(*pairing_id));
        }
        Ok(state.waiting.insert(entry.user_id, entry.clone()))
    }

    async fn remove(&self, user_id: UserId) -> RepoResult<Option<WaitingEntry>> {
        self.ensure_available()?;
        Ok(self.state.lock().waiting.remove(&user_id))
    }

    async fn find(&self, user_id: UserId) -> RepoResult<Option<WaitingEntry>> {
        self.ensure_available()?;
        Ok(self.state.lock().waiting.get(&user_id).cloned())
    }

    async fn find_candidate(
        &self,
        mode: MatchMode,
        excluding: UserId,
    ) -> RepoResult<Option<WaitingEntry>> {
        self.ensure_available()?;
        let state = self.state.lock();
        Ok(state
            .sorted_pool(mode)
            .into_iter()
            .find(|e| e.user_id != excluding)
            .cloned())
    }

    async fn list(&self, mode: MatchMode, limit: i64) -> RepoResult<Vec<WaitingEntry>> {
        self.ensure_available()?;
        let limit = usize::try_from(limit.clamp(1, 100)).unwrap_or(100);
        let state = self.state.lock();
        Ok(state
            .sorted_pool(mode)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<WaitingEntry>> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        let stale: Vec<UserId> = state
            .waiting
            .values()
            .filter(|e| e.enqueued_at < cutoff)
            .map(|e| e.user_id)
            .collect();
        Ok(stale
            .into_iter()
            .filter_map(|user| state.waiting.remove(&user))
            .collect())
    }
}

// ============================================================================
// Pairings
// ============================================================================

#[async_trait]
impl PairingStore for MemoryMatchStore {
    #[instrument(skip(self, pairing), fields(pairing_id = %pairing.id))]
    async fn create_and_drain(&self, pairing: &Pairing) -> RepoResult<()> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        let participants = pairing.participants();
        let all_waiting = participants.iter().all(|user| {
            state
                .waiting
                .get(user)
                .is_some_and(|entry| entry.mode == pairing.mode)
        });
        let any_active = participants.iter().any(|user| state.active.contains_key(user));
        if !all_waiting || any_active || state.pairings.contains_key(&pairing.id) {
            debug!("Candidate already claimed");
            return Err(DomainError::PairingConflict);
        }

        for user in participants {
            state.waiting.remove(&user);
            state.active.insert(user, pairing.id);
        }
        state.pairings.insert(pairing.id, pairing.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Pairing>> {
        self.ensure_available()?;
        Ok(self.state.lock().pairings.get(&id).cloned())
    }

    async fn find_active_for_user(&self, user_id: UserId) -> RepoResult<Option<Pairing>> {
        self.ensure_available()?;
        let state = self.state.lock();
        Ok(state
            .active
            .get(&user_id)
            .and_then(|id| state.pairings.get(id))
            .filter(|p| p.is_active())
            .cloned())
    }

    async fn record_consent(
        &self,
        id: Snowflake,
        side: Side,
        now: DateTime<Utc>,
    ) -> RepoResult<ConsentWrite> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        let pairing = state
            .pairings
            .get_mut(&id)
            .ok_or(DomainError::PairingNotFound(id))?;

        Ok(if pairing.record_consent(side, now) {
            ConsentWrite::Recorded(pairing.clone())
        } else if pairing.is_active() {
            ConsentWrite::AlreadyRecorded(pairing.clone())
        } else {
            ConsentWrite::Closed(pairing.clone())
        })
    }

    async fn mark_mutual(&self, id: Snowflake, now: DateTime<Utc>) -> RepoResult<Option<Pairing>> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        let Some(pairing) = state.pairings.get_mut(&id) else {
            return Ok(None);
        };
        if !pairing.mark_mutual(now) {
            return Ok(None);
        }
        let won = pairing.clone();
        state.release(&won);
        Ok(Some(won))
    }

    async fn mark_abandoned(
        &self,
        id: Snowflake,
        reason: AbandonReason,
        closed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Pairing>> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        let Some(pairing) = state.pairings.get_mut(&id) else {
            return Ok(None);
        };
        if !pairing.mark_abandoned(reason, closed_by, now) {
            return Ok(None);
        }
        let won = pairing.clone();
        state.release(&won);
        Ok(Some(won))
    }

    async fn find_expired(&self, cutoff: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Pairing>> {
        self.ensure_available()?;
        let limit = usize::try_from(limit.clamp(1, 500)).unwrap_or(500);
        let state = self.state.lock();
        let mut expired: Vec<Pairing> = state
            .pairings
            .values()
            .filter(|p| p.is_active() && p.decision_deadline <= cutoff)
            .cloned()
            .collect();
        expired.sort_by_key(|p| p.decision_deadline);
        expired.truncate(limit);
        Ok(expired)
    }
}

// ============================================================================
// Ledger
// ============================================================================

#[async_trait]
impl Ledger for MemoryMatchStore {
    #[instrument(skip(self, adjustment), fields(key = %adjustment.idempotency_key))]
    async fn adjust(&self, adjustment: &LedgerAdjustment) -> RepoResult<LedgerReceipt> {
        self.ensure_available()?;
        let mut state = self.state.lock();
        let slot = (adjustment.user_id, adjustment.kind);
        let current = state.balances.get(&slot).copied().unwrap_or(0);

        if state.applied_keys.contains(&adjustment.idempotency_key) {
            return Ok(LedgerReceipt {
                applied: false,
                balance: current,
            });
        }
        let balance = current + adjustment.amount;
        if adjustment.kind == LedgerKind::Coins && balance < 0 {
            return Err(DomainError::ValidationError(
                "coin balance cannot go negative".to_string(),
            ));
        }

        state.applied_keys.insert(adjustment.idempotency_key.clone());
        state.balances.insert(slot, balance);
        Ok(LedgerReceipt {
            applied: true,
            balance,
        })
    }

    #[instrument(skip(self, adjustment), fields(key = %adjustment.idempotency_key))]
    async fn spend_if_available(&self, adjustment: &LedgerAdjustment) -> RepoResult<SpendOutcome> {
        self.ensure_available()?;
        if adjustment.kind != LedgerKind::Coins || adjustment.amount > 0 {
            return Err(DomainError::ValidationError(
                "only coin debits can be spent".to_string(),
            ));
        }

        let mut state = self.state.lock();
        if state.applied_keys.contains(&adjustment.idempotency_key) {
            return Ok(SpendOutcome::Duplicate);
        }
        let slot = (adjustment.user_id, LedgerKind::Coins);
        let balance = state.balances.get(&slot).copied().unwrap_or(0);
        let cost = -adjustment.amount;
        if balance < cost {
            return Ok(SpendOutcome::Insufficient { balance });
        }

        state.applied_keys.insert(adjustment.idempotency_key.clone());
        state.balances.insert(slot, balance - cost);
        Ok(SpendOutcome::Spent {
            balance: balance - cost,
        })
    }

    async fn balance(&self, user_id: UserId, kind: LedgerKind) -> RepoResult<i64> {
        self.ensure_available()?;
        Ok(self
            .state
            .lock()
            .balances
            .get(&(user_id, kind))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(user: UserId, mode: MatchMode, ticket: i64, at: DateTime<Utc>) -> WaitingEntry {
        WaitingEntry::new(user, mode, Snowflake::new(ticket), at)
    }

    fn pairing_for(a: UserId, b: UserId, id: i64, now: DateTime<Utc>) -> Pairing {
        Pairing::new(Snowflake::new(id), a, b, MatchMode::Voice, now, Duration::seconds(30))
    }

    #[tokio::test]
    async fn test_candidate_is_oldest_other_entry() {
        let store = MemoryMatchStore::new();
        let now = Utc::now();
        let (a, b, c) = (UserId::random(), UserId::random(), UserId::random());

        store.upsert(&entry(c, MatchMode::Voice, 3, now)).await.unwrap();
        store.upsert(&entry(b, MatchMode::Voice, 2, now)).await.unwrap();
        store
            .upsert(&entry(a, MatchMode::Voice, 1, now - Duration::seconds(1)))
            .await
            .unwrap();
        store.upsert(&entry(UserId::random(), MatchMode::Text, 0, now - Duration::hours(1))).await.unwrap();

        let found = store.find_candidate(MatchMode::Voice, a).await.unwrap().unwrap();
        assert_eq!(found.user_id, b, "same timestamp breaks tie on ticket");

        let found = store.find_candidate(MatchMode::Voice, c).await.unwrap().unwrap();
        assert_eq!(found.user_id, a);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_refuses_when_paired() {
        let store = MemoryMatchStore::new();
        let now = Utc::now();
        let (a, b) = (UserId::random(), UserId::random());

        assert!(store.upsert(&entry(a, MatchMode::Voice, 1, now)).await.unwrap().is_none());
        let replaced = store.upsert(&entry(a, MatchMode::Text, 2, now)).await.unwrap();
        assert_eq!(replaced.map(|e| e.mode), Some(MatchMode::Voice));
        assert_eq!(store.waiting_count(), 1);

        store.upsert(&entry(a, MatchMode::Voice, 3, now)).await.unwrap();
        store.upsert(&entry(b, MatchMode::Voice, 4, now)).await.unwrap();
        store.create_and_drain(&pairing_for(a, b, 10, now)).await.unwrap();

        let err = store.upsert(&entry(a, MatchMode::Voice, 5, now)).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyPaired(id) if id == Snowflake::new(10)));
        assert_eq!(store.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_create_and_drain_is_all_or_nothing() {
        let store = MemoryMatchStore::new();
        let now = Utc::now();
        let (a, b, c) = (UserId::random(), UserId::random(), UserId::random());
        store.upsert(&entry(a, MatchMode::Voice, 1, now)).await.unwrap();
        store.upsert(&entry(b, MatchMode::Voice, 2, now)).await.unwrap();
        store.upsert(&entry(c, MatchMode::Voice, 3, now)).await.unwrap();

        store.create_and_drain(&pairing_for(a, b, 10, now)).await.unwrap();
        // a is gone, so a second claim on a must leave c untouched
        let err = store.create_and_drain(&pairing_for(a, c, 11, now)).await.unwrap_err();
        assert!(matches!(err, DomainError::PairingConflict));
        assert!(store.find(c).await.unwrap().is_some());
        assert_eq!(store.pairing_count(), 1);
    }

    #[tokio::test]
    async fn test_terminal_transition_releases_participants() {
        let store = MemoryMatchStore::new();
        let now = Utc::now();
        let (a, b) = (UserId::random(), UserId::random());
        store.upsert(&entry(a, MatchMode::Voice, 1, now)).await.unwrap();
        store.upsert(&entry(b, MatchMode::Voice, 2, now)).await.unwrap();
        let pairing = pairing_for(a, b, 10, now);
        store.create_and_drain(&pairing).await.unwrap();

        let won = store
            .mark_abandoned(pairing.id, AbandonReason::Skipped, Some(a), now)
            .await
            .unwrap();
        assert!(won.is_some());
        assert!(store
            .mark_abandoned(pairing.id, AbandonReason::Skipped, Some(b), now)
            .await
            .unwrap()
            .is_none());
        assert!(store.find_active_for_user(a).await.unwrap().is_none());
        assert!(store.upsert(&entry(a, MatchMode::Voice, 3, now)).await.is_ok());
    }

    #[tokio::test]
    async fn test_ledger_keys_apply_once() {
        let store = MemoryMatchStore::new();
        let user = UserId::random();
        let reward = LedgerAdjustment::unlock_reward(Snowflake::new(1), user, 10);

        assert!(store.adjust(&reward).await.unwrap().applied);
        let again = store.adjust(&reward).await.unwrap();
        assert!(!again.applied);
        assert_eq!(again.balance, 10);
        assert_eq!(store.balance(user, LedgerKind::Xp).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_spend_if_available() {
        let store = MemoryMatchStore::new();
        let user = UserId::random();
        store.seed_balance(user, LedgerKind::Coins, 1);

        let first = LedgerAdjustment::skip_penalty(Snowflake::new(1), user, 1);
        assert_eq!(
            store.spend_if_available(&first).await.unwrap(),
            SpendOutcome::Spent { balance: 0 }
        );
        assert_eq!(store.spend_if_available(&first).await.unwrap(), SpendOutcome::Duplicate);

        let second = LedgerAdjustment::skip_penalty(Snowflake::new(2), user, 1);
        assert_eq!(
            store.spend_if_available(&second).await.unwrap(),
            SpendOutcome::Insufficient { balance: 0 }
        );
        // An insufficient attempt does not burn the key
        store.seed_balance(user, LedgerKind::Coins, 3);
        assert_eq!(
            store.spend_if_available(&second).await.unwrap(),
            SpendOutcome::Spent { balance: 2 }
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryMatchStore::new();
        store.set_available(false);
        let err = store.find(UserId::random()).await.unwrap_err();
        assert!(err.is_retryable());

        store.set_available(true);
        assert!(store.find(UserId::random()).await.unwrap().is_none());
    }
}
