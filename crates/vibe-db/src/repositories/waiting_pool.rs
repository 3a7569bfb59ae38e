//! PostgreSQL implementation of WaitingPoolStore

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use vibe_core::{
    DomainError, MatchMode, RepoResult, Snowflake, UserId, WaitingEntry, WaitingPoolStore,
};

use super::error::map_db_error;
use super::locks::lock_users;
use crate::models::WaitingEntryModel;

const ENTRY_COLUMNS: &str = "user_id, mode, ticket, enqueued_at";

#[derive(Clone)]
pub struct PgWaitingPoolStore {
    pool: PgPool,
}

impl PgWaitingPoolStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_entries(models: Vec<WaitingEntryModel>) -> RepoResult<Vec<WaitingEntry>> {
    models.into_iter().map(WaitingEntry::try_from).collect()
}

#[async_trait]
impl WaitingPoolStore for PgWaitingPoolStore {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, mode = %entry.mode))]
    async fn upsert(&self, entry: &WaitingEntry) -> RepoResult<Option<WaitingEntry>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        lock_users(&mut tx, &[entry.user_id]).await?;

        // Under the user's lock no pairing can be created for them until commit
        let active = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT pairing_id FROM active_participants WHERE user_id = $1
            "#,
        )
        .bind(entry.user_id.into_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if let Some(pairing_id) = active {
            debug!(pairing_id, "Enqueue refused, user is paired");
            return Err(DomainError::AlreadyPaired(Snowflake::new(pairing_id)));
        }

        let replaced = sqlx::query_as::<_, WaitingEntryModel>(&format!(
            "DELETE FROM waiting_entries WHERE user_id = $1 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(entry.user_id.into_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO waiting_entries (user_id, mode, ticket, enqueued_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.user_id.into_uuid())
        .bind(entry.mode.as_str())
        .bind(entry.ticket.into_inner())
        .bind(entry.enqueued_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        replaced.map(WaitingEntry::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn remove(&self, user_id: UserId) -> RepoResult<Option<WaitingEntry>> {
        let removed = sqlx::query_as::<_, WaitingEntryModel>(&format!(
            "DELETE FROM waiting_entries WHERE user_id = $1 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        removed.map(WaitingEntry::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find(&self, user_id: UserId) -> RepoResult<Option<WaitingEntry>> {
        let entry = sqlx::query_as::<_, WaitingEntryModel>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM waiting_entries WHERE user_id = $1"
        ))
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        entry.map(WaitingEntry::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_candidate(
        &self,
        mode: MatchMode,
        excluding: UserId,
    ) -> RepoResult<Option<WaitingEntry>> {
        let entry = sqlx::query_as::<_, WaitingEntryModel>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM waiting_entries
            WHERE mode = $1 AND user_id <> $2
            ORDER BY enqueued_at, ticket
            LIMIT 1
            "#
        ))
        .bind(mode.as_str())
        .bind(excluding.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        entry.map(WaitingEntry::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, mode: MatchMode, limit: i64) -> RepoResult<Vec<WaitingEntry>> {
        let limit = limit.clamp(1, 100);

        let models = sqlx::query_as::<_, WaitingEntryModel>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM waiting_entries
            WHERE mode = $1
            ORDER BY enqueued_at, ticket
            LIMIT $2
            "#
        ))
        .bind(mode.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        into_entries(models)
    }

    #[instrument(skip(self))]
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<Vec<WaitingEntry>> {
        let models = sqlx::query_as::<_, WaitingEntryModel>(&format!(
            "DELETE FROM waiting_entries WHERE enqueued_at < $1 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        into_entries(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgWaitingPoolStore>();
    }
}
