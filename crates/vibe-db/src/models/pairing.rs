//! Pairing database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for pairings table
#[derive(Debug, Clone, FromRow)]
pub struct PairingModel {
    pub id: i64,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub mode: String,
    pub consent_a: bool,
    pub consent_b: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub decision_deadline: DateTime<Utc>,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub rtc_channel: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_reason: Option<String>,
    pub closed_by: Option<Uuid>,
}
