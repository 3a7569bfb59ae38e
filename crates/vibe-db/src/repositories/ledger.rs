//! PostgreSQL implementation of Ledger
//!
//! Balances change only through the `update_user_coins`, `spend_user_coins`
//! and `update_user_xp` functions, which journal every change under its
//! idempotency key in the same statement.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use vibe_core::{
    DomainError, Ledger, LedgerAdjustment, LedgerKind, LedgerReceipt, RepoResult, SpendOutcome,
    UserId,
};

use super::error::map_db_error;

#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    #[instrument(skip(self, adjustment), fields(user_id = %adjustment.user_id, key = %adjustment.idempotency_key))]
    async fn adjust(&self, adjustment: &LedgerAdjustment) -> RepoResult<LedgerReceipt> {
        let (applied, balance) = match adjustment.kind {
            LedgerKind::Coins => sqlx::query_as::<_, (bool, i64)>(
                r#"
                SELECT applied, balance FROM update_user_coins($1, $2, $3, $4, $5)
                "#,
            )
            .bind(adjustment.user_id.into_uuid())
            .bind(adjustment.amount)
            .bind(adjustment.transaction_type())
            .bind(&adjustment.reason)
            .bind(&adjustment.idempotency_key),
            LedgerKind::Xp => sqlx::query_as::<_, (bool, i64)>(
                r#"
                SELECT applied, balance FROM update_user_xp($1, $2, $3, $4)
                "#,
            )
            .bind(adjustment.user_id.into_uuid())
            .bind(adjustment.amount)
            .bind(&adjustment.reason)
            .bind(&adjustment.idempotency_key),
        }
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(LedgerReceipt { applied, balance })
    }

    #[instrument(skip(self, adjustment), fields(user_id = %adjustment.user_id, key = %adjustment.idempotency_key))]
    async fn spend_if_available(&self, adjustment: &LedgerAdjustment) -> RepoResult<SpendOutcome> {
        if adjustment.kind != LedgerKind::Coins || adjustment.amount > 0 {
            return Err(DomainError::ValidationError(
                "only coin debits can be spent".to_string(),
            ));
        }

        let (outcome, balance) = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT outcome, balance FROM spend_user_coins($1, $2, $3, $4)
            "#,
        )
        .bind(adjustment.user_id.into_uuid())
        .bind(-adjustment.amount)
        .bind(&adjustment.reason)
        .bind(&adjustment.idempotency_key)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        match outcome.as_str() {
            "spent" => Ok(SpendOutcome::Spent { balance }),
            "insufficient" => Ok(SpendOutcome::Insufficient { balance }),
            "duplicate" => Ok(SpendOutcome::Duplicate),
            other => Err(DomainError::DatabaseError(format!(
                "unexpected spend outcome: {other}"
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn balance(&self, user_id: UserId, kind: LedgerKind) -> RepoResult<i64> {
        let column = match kind {
            LedgerKind::Coins => "coins",
            LedgerKind::Xp => "xp",
        };

        let balance = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT {column} FROM profiles WHERE id = $1"
        ))
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(balance.unwrap_or(0))
    }
}
