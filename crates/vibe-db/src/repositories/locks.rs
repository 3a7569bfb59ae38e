//! Per-user advisory locks
//!
//! Enqueue and pair-and-drain both lock every user they touch for the rest of
//! the transaction. Locks are always taken in ascending user order so two
//! transactions touching the same pair cannot deadlock.

use sqlx::{Postgres, Transaction};
use vibe_core::{RepoResult, UserId};

use super::error::map_db_error;

pub(crate) async fn lock_users(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserId],
) -> RepoResult<()> {
    let mut ordered = users.to_vec();
    ordered.sort_unstable();
    ordered.dedup();

    for user in ordered {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
    }
    Ok(())
}
