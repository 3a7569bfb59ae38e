//! Response DTOs for API endpoints
//!
//! Pairings are rendered from the viewer's side: "your" consent versus
//! "their" consent. Snowflake ids serialize as strings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vibe_core::{AbandonReason, MatchMode, PairingStatus, Side, Snowflake, UserId};

use crate::services::{ConsentOutcome, PenaltyOutcome};

// ============================================================================
// Pool Responses
// ============================================================================

/// The caller's own waiting entry
#[derive(Debug, Clone, Serialize)]
pub struct WaitingResponse {
    pub mode: MatchMode,
    pub ticket: Snowflake,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolEntryResponse {
    pub user_id: UserId,
    pub ticket: Snowflake,
    pub enqueued_at: DateTime<Utc>,
}

/// Oldest-first pool snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PoolSnapshotResponse {
    pub mode: MatchMode,
    pub count: usize,
    pub entries: Vec<PoolEntryResponse>,
}

// ============================================================================
// Pairing Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PairingResponse {
    pub id: Snowflake,
    pub mode: MatchMode,
    pub status: PairingStatus,
    pub side: Side,
    pub counterpart: UserId,
    pub your_consent: bool,
    pub their_consent: bool,
    pub created_at: DateTime<Utc>,
    pub decision_deadline: DateTime<Utc>,
    /// Milliseconds left on the countdown; zero once passed or closed
    pub remaining_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Channel to join through the media SDK once unlocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtc_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<AbandonReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<UserId>,
}

/// Caller's matching state
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchStatusResponse {
    Idle,
    Waiting { entry: WaitingResponse },
    Paired { pairing: PairingResponse },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsentResponse {
    #[serde(flatten)]
    pub pairing: PairingResponse,
    pub outcome: ConsentOutcome,
}

/// Result of a skip or an expiry
#[derive(Debug, Clone, Serialize)]
pub struct AbandonResponse {
    #[serde(flatten)]
    pub pairing: PairingResponse,
    pub penalty: PenaltyOutcome,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health of each backing dependency
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub store: String,
    pub events: String,
}

impl ReadinessResponse {
    pub fn ready(store_healthy: bool, events_healthy: bool) -> Self {
        let label = |ok: bool| if ok { "healthy" } else { "unhealthy" }.to_string();
        Self {
            status: if store_healthy && events_healthy {
                "ready"
            } else {
                "not_ready"
            }
            .to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                store: label(store_healthy),
                events: label(events_healthy),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}
