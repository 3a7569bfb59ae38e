//! PostgreSQL implementation of PairingStore
//!
//! Status transitions are single conditional UPDATEs; the row comes back only
//! to the caller whose statement matched, which is how "first transition wins"
//! is enforced across processes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use vibe_core::{
    AbandonReason, ConsentWrite, DomainError, Pairing, PairingStore, RepoResult, Side, Snowflake,
    UserId,
};

use super::error::{map_db_error, map_unique_violation};
use super::locks::lock_users;
use crate::models::PairingModel;

const PAIRING_COLUMNS: &str = "id, participant_a, participant_b, mode, consent_a, consent_b, \
     status, created_at, updated_at, decision_deadline, unlocked_at, rtc_channel, ended_at, \
     end_reason, closed_by";

#[derive(Clone)]
pub struct PgPairingStore {
    pool: PgPool,
}

impl PgPairingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: Snowflake) -> RepoResult<Option<Pairing>> {
        let model = sqlx::query_as::<_, PairingModel>(&format!(
            "SELECT {PAIRING_COLUMNS} FROM pairings WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        model.map(Pairing::try_from).transpose()
    }
}

#[async_trait]
impl PairingStore for PgPairingStore {
    #[instrument(skip(self, pairing), fields(pairing_id = %pairing.id))]
    async fn create_and_drain(&self, pairing: &Pairing) -> RepoResult<()> {
        let participants = pairing.participants();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        lock_users(&mut tx, &participants).await?;

        let drained = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            DELETE FROM waiting_entries
            WHERE user_id = ANY($1) AND mode = $2
            RETURNING user_id
            "#,
        )
        .bind(participants.map(UserId::into_uuid).to_vec())
        .bind(pairing.mode.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if drained.len() != 2 {
            // Dropping the transaction rolls the partial delete back
            debug!(drained = drained.len(), "Candidate already claimed");
            return Err(DomainError::PairingConflict);
        }

        sqlx::query(
            r#"
            INSERT INTO pairings (
                id, participant_a, participant_b, mode, consent_a, consent_b, status,
                created_at, updated_at, decision_deadline
            )
            VALUES ($1, $2, $3, $4, FALSE, FALSE, 'active', $5, $5, $6)
            "#,
        )
        .bind(pairing.id.into_inner())
        .bind(pairing.participant_a.into_uuid())
        .bind(pairing.participant_b.into_uuid())
        .bind(pairing.mode.as_str())
        .bind(pairing.created_at)
        .bind(pairing.decision_deadline)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO active_participants (user_id, pairing_id)
            VALUES ($1, $3), ($2, $3)
            "#,
        )
        .bind(pairing.participant_a.into_uuid())
        .bind(pairing.participant_b.into_uuid())
        .bind(pairing.id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::PairingConflict))?;

        tx.commit().await.map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Pairing>> {
        self.fetch(id).await
    }

    #[instrument(skip(self))]
    async fn find_active_for_user(&self, user_id: UserId) -> RepoResult<Option<Pairing>> {
        let model = sqlx::query_as::<_, PairingModel>(&format!(
            r#"
            SELECT {PAIRING_COLUMNS}
            FROM pairings
            WHERE id = (SELECT pairing_id FROM active_participants WHERE user_id = $1)
              AND status = 'active'
            "#
        ))
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        model.map(Pairing::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn record_consent(
        &self,
        id: Snowflake,
        side: Side,
        now: DateTime<Utc>,
    ) -> RepoResult<ConsentWrite> {
        let flag = match side {
            Side::A => "consent_a",
            Side::B => "consent_b",
        };

        let updated = sqlx::query_as::<_, PairingModel>(&format!(
            r#"
            UPDATE pairings
            SET {flag} = TRUE, updated_at = $2
            WHERE id = $1 AND status = 'active' AND NOT {flag}
            RETURNING {PAIRING_COLUMNS}
            "#
        ))
        .bind(id.into_inner())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        if let Some(model) = updated {
            return Ok(ConsentWrite::Recorded(Pairing::try_from(model)?));
        }

        let current = self
            .fetch(id)
            .await?
            .ok_or(DomainError::PairingNotFound(id))?;

        Ok(if current.is_active() {
            ConsentWrite::AlreadyRecorded(current)
        } else {
            ConsentWrite::Closed(current)
        })
    }

    #[instrument(skip(self))]
    async fn mark_mutual(&self, id: Snowflake, now: DateTime<Utc>) -> RepoResult<Option<Pairing>> {
        let model = sqlx::query_as::<_, PairingModel>(&format!(
            r#"
            WITH won AS (
                UPDATE pairings
                SET status = 'mutual',
                    unlocked_at = $2,
                    updated_at = $2,
                    rtc_channel = CASE
                        WHEN mode IN ('voice', 'video') THEN 'vibe-' || mode || '-' || id::text
                    END
                WHERE id = $1 AND status = 'active' AND consent_a AND consent_b
                RETURNING {PAIRING_COLUMNS}
            ), released AS (
                DELETE FROM active_participants WHERE pairing_id IN (SELECT id FROM won)
            )
            SELECT {PAIRING_COLUMNS} FROM won
            "#
        ))
        .bind(id.into_inner())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        model.map(Pairing::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn mark_abandoned(
        &self,
        id: Snowflake,
        reason: AbandonReason,
        closed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Pairing>> {
        let model = sqlx::query_as::<_, PairingModel>(&format!(
            r#"
            WITH won AS (
                UPDATE pairings
                SET status = 'abandoned',
                    end_reason = $2,
                    closed_by = $3,
                    ended_at = $4,
                    updated_at = $4
                WHERE id = $1
                  AND status = 'active'
                  AND ($2 <> 'timed_out' OR decision_deadline <= $4)
                RETURNING {PAIRING_COLUMNS}
            ), released AS (
                DELETE FROM active_participants WHERE pairing_id IN (SELECT id FROM won)
            )
            SELECT {PAIRING_COLUMNS} FROM won
            "#
        ))
        .bind(id.into_inner())
        .bind(reason.as_str())
        .bind(closed_by.map(UserId::into_uuid))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        model.map(Pairing::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_expired(&self, cutoff: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Pairing>> {
        let models = sqlx::query_as::<_, PairingModel>(&format!(
            r#"
            SELECT {PAIRING_COLUMNS}
            FROM pairings
            WHERE status = 'active' AND decision_deadline <= $1
            ORDER BY decision_deadline
            LIMIT $2
            "#
        ))
        .bind(cutoff)
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        models.into_iter().map(Pairing::try_from).collect()
    }
}
