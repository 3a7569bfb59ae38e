//! Match events
//!
//! These events are used for:
//! - Telling both participants that a pairing formed, progressed or ended
//! - Waking a passively waiting client when another user's arbiter pass pairs it
//! - Pool activity feeds for operators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{AbandonReason, Pairing};
use crate::value_objects::{MatchMode, Snowflake, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchEvent {
    // =========================================================================
    // Pool Events
    // =========================================================================
    PoolEntered(PoolEnteredEvent),
    PoolLeft(PoolLeftEvent),

    // =========================================================================
    // Pairing Events
    // =========================================================================
    PairingCreated(PairingCreatedEvent),
    ConsentRecorded(ConsentRecordedEvent),
    PairingUnlocked(PairingUnlockedEvent),
    PairingAbandoned(PairingAbandonedEvent),

    // =========================================================================
    // Ledger Events
    // =========================================================================
    EarnBackOffered(EarnBackOfferedEvent),
}

impl MatchEvent {
    pub fn pairing_created(pairing: &Pairing) -> Self {
        Self::PairingCreated(PairingCreatedEvent {
            pairing_id: pairing.id,
            participants: pairing.participants(),
            mode: pairing.mode,
            decision_deadline: pairing.decision_deadline,
            timestamp: pairing.created_at,
        })
    }

    pub fn consent_recorded(pairing: &Pairing, voter: UserId, timestamp: DateTime<Utc>) -> Self {
        Self::ConsentRecorded(ConsentRecordedEvent {
            pairing_id: pairing.id,
            voter,
            counterpart: pairing.counterpart_of(voter).unwrap_or(voter),
            mutual: pairing.both_consented(),
            timestamp,
        })
    }

    pub fn pairing_unlocked(pairing: &Pairing, timestamp: DateTime<Utc>) -> Self {
        Self::PairingUnlocked(PairingUnlockedEvent {
            pairing_id: pairing.id,
            participants: pairing.participants(),
            mode: pairing.mode,
            rtc_channel: pairing.rtc_channel.clone(),
            timestamp,
        })
    }

    pub fn pairing_abandoned(pairing: &Pairing, timestamp: DateTime<Utc>) -> Self {
        Self::PairingAbandoned(PairingAbandonedEvent {
            pairing_id: pairing.id,
            participants: pairing.participants(),
            reason: pairing.end_reason.unwrap_or(AbandonReason::TimedOut),
            closed_by: pairing.closed_by,
            timestamp,
        })
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PoolEntered(_) => "POOL_ENTERED",
            Self::PoolLeft(_) => "POOL_LEFT",
            Self::PairingCreated(_) => "PAIRING_CREATED",
            Self::ConsentRecorded(_) => "CONSENT_RECORDED",
            Self::PairingUnlocked(_) => "PAIRING_UNLOCKED",
            Self::PairingAbandoned(_) => "PAIRING_ABANDONED",
            Self::EarnBackOffered(_) => "EARN_BACK_OFFERED",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PoolEntered(e) => e.timestamp,
            Self::PoolLeft(e) => e.timestamp,
            Self::PairingCreated(e) => e.timestamp,
            Self::ConsentRecorded(e) => e.timestamp,
            Self::PairingUnlocked(e) => e.timestamp,
            Self::PairingAbandoned(e) => e.timestamp,
            Self::EarnBackOffered(e) => e.timestamp,
        }
    }

    /// Users this event is addressed to
    pub fn recipients(&self) -> Vec<UserId> {
        match self {
            Self::PoolEntered(e) => vec![e.user_id],
            Self::PoolLeft(e) => vec![e.user_id],
            Self::PairingCreated(e) => e.participants.to_vec(),
            Self::ConsentRecorded(e) => vec![e.voter, e.counterpart],
            Self::PairingUnlocked(e) => e.participants.to_vec(),
            Self::PairingAbandoned(e) => e.participants.to_vec(),
            Self::EarnBackOffered(e) => vec![e.user_id],
        }
    }

    pub fn pairing_id(&self) -> Option<Snowflake> {
        match self {
            Self::PoolEntered(_) | Self::PoolLeft(_) => None,
            Self::PairingCreated(e) => Some(e.pairing_id),
            Self::ConsentRecorded(e) => Some(e.pairing_id),
            Self::PairingUnlocked(e) => Some(e.pairing_id),
            Self::PairingAbandoned(e) => Some(e.pairing_id),
            Self::EarnBackOffered(e) => Some(e.pairing_id),
        }
    }

    pub fn mode(&self) -> Option<MatchMode> {
        match self {
            Self::PoolEntered(e) => Some(e.mode),
            Self::PoolLeft(e) => Some(e.mode),
            Self::PairingCreated(e) => Some(e.mode),
            Self::PairingUnlocked(e) => Some(e.mode),
            _ => None,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEnteredEvent {
    pub user_id: UserId,
    pub mode: MatchMode,
    pub ticket: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLeftEvent {
    pub user_id: UserId,
    pub mode: MatchMode,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingCreatedEvent {
    pub pairing_id: Snowflake,
    pub participants: [UserId; 2],
    pub mode: MatchMode,
    pub decision_deadline: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// "They are deciding": one side voted. `mutual` is set when this vote completed the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecordedEvent {
    pub pairing_id: Snowflake,
    pub voter: UserId,
    pub counterpart: UserId,
    pub mutual: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingUnlockedEvent {
    pub pairing_id: Snowflake,
    pub participants: [UserId; 2],
    pub mode: MatchMode,
    pub rtc_channel: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingAbandonedEvent {
    pub pairing_id: Snowflake,
    pub participants: [UserId; 2],
    pub reason: AbandonReason,
    pub closed_by: Option<UserId>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnBackOfferedEvent {
    pub pairing_id: Snowflake,
    pub user_id: UserId,
    pub coins: i64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pairing() -> Pairing {
        Pairing::new(
            Snowflake::new(7),
            UserId::random(),
            UserId::random(),
            MatchMode::Video,
            Utc::now(),
            Duration::seconds(30),
        )
    }

    #[test]
    fn test_serialized_tag_matches_event_type() {
        let event = MatchEvent::pairing_created(&pairing());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type());
        assert_eq!(json["pairing_id"], "7");

        let back: MatchEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_consent_event_addresses_both_sides() {
        let p = pairing();
        let event = MatchEvent::consent_recorded(&p, p.participant_b, Utc::now());
        let recipients = event.recipients();
        assert!(recipients.contains(&p.participant_a));
        assert!(recipients.contains(&p.participant_b));
    }
}
