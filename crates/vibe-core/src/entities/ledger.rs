//! Ledger records - coin and XP adjustments with at-most-once keys

use serde::{Deserialize, Serialize};

use crate::value_objects::{Snowflake, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Coins,
    Xp,
}

impl LedgerKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Coins => "coins",
            Self::Xp => "xp",
        }
    }
}

/// A signed balance change. Two adjustments with the same key apply once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAdjustment {
    pub user_id: UserId,
    pub amount: i64,
    pub kind: LedgerKind,
    pub reason: String,
    pub idempotency_key: String,
}

impl LedgerAdjustment {
    /// XP granted to `user_id` when `pairing_id` unlocks
    pub fn unlock_reward(pairing_id: Snowflake, user_id: UserId, xp: i64) -> Self {
        Self {
            user_id,
            amount: xp,
            kind: LedgerKind::Xp,
            reason: "Mutual vibe".to_string(),
            idempotency_key: format!("pairing:{pairing_id}:unlock:{user_id}"),
        }
    }

    /// Coins charged to `user_id` for leaving `pairing_id` early
    pub fn skip_penalty(pairing_id: Snowflake, user_id: UserId, cost: i64) -> Self {
        Self {
            user_id,
            amount: -cost,
            kind: LedgerKind::Coins,
            reason: "Skip match".to_string(),
            idempotency_key: format!("pairing:{pairing_id}:penalty:{user_id}"),
        }
    }

    /// "spent" for debits, "earned" for credits
    pub fn transaction_type(&self) -> &'static str {
        if self.amount < 0 {
            "spent"
        } else {
            "earned"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// False when the idempotency key had already been applied
    pub applied: bool,
    pub balance: i64,
}

/// Result of a conditional debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SpendOutcome {
    Spent { balance: i64 },
    Insufficient { balance: i64 },
    /// The same key was already charged
    Duplicate,
}

/// Offered instead of a charge when the user cannot pay for a skip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnBackOffer {
    pub user_id: UserId,
    pub coins: i64,
    pub action: String,
}

impl EarnBackOffer {
    pub fn watch_ad(user_id: UserId, coins: i64) -> Self {
        Self {
            user_id,
            coins,
            action: "Watched advertisement".to_string(),
        }
    }
}
