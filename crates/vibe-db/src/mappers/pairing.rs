//! Pairing <-> model mapper

use vibe_core::{AbandonReason, DomainError, Pairing, PairingStatus, Snowflake, UserId};

use super::parse_mode;
use crate::models::PairingModel;

impl TryFrom<PairingModel> for Pairing {
    type Error = DomainError;

    fn try_from(model: PairingModel) -> Result<Self, Self::Error> {
        let status = PairingStatus::parse(&model.status).ok_or_else(|| {
            DomainError::DatabaseError(format!("unknown pairing status: {}", model.status))
        })?;
        let end_reason = model
            .end_reason
            .as_deref()
            .map(|raw| {
                AbandonReason::parse(raw)
                    .ok_or_else(|| DomainError::DatabaseError(format!("unknown end reason: {raw}")))
            })
            .transpose()?;

        Ok(Pairing {
            id: Snowflake::new(model.id),
            participant_a: UserId::from_uuid(model.participant_a),
            participant_b: UserId::from_uuid(model.participant_b),
            mode: parse_mode(&model.mode)?,
            consent_a: model.consent_a,
            consent_b: model.consent_b,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
            decision_deadline: model.decision_deadline,
            unlocked_at: model.unlocked_at,
            rtc_channel: model.rtc_channel,
            ended_at: model.ended_at,
            end_reason,
            closed_by: model.closed_by.map(UserId::from_uuid),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;
    use vibe_core::MatchMode;

    fn model() -> PairingModel {
        let now = Utc::now();
        PairingModel {
            id: 42,
            participant_a: Uuid::new_v4(),
            participant_b: Uuid::new_v4(),
            mode: "video".to_string(),
            consent_a: true,
            consent_b: false,
            status: "abandoned".to_string(),
            created_at: now,
            updated_at: now,
            decision_deadline: now + Duration::seconds(30),
            unlocked_at: None,
            rtc_channel: None,
            ended_at: Some(now),
            end_reason: Some("timed_out".to_string()),
            closed_by: None,
        }
    }

    #[test]
    fn test_model_to_entity() {
        let pairing = Pairing::try_from(model()).unwrap();
        assert_eq!(pairing.id, Snowflake::new(42));
        assert_eq!(pairing.mode, MatchMode::Video);
        assert_eq!(pairing.status, PairingStatus::Abandoned);
        assert_eq!(pairing.end_reason, Some(AbandonReason::TimedOut));
    }

    #[test]
    fn test_corrupt_status_is_a_database_error() {
        let mut bad = model();
        bad.status = "paused".to_string();
        assert!(matches!(
            Pairing::try_from(bad),
            Err(DomainError::DatabaseError(_))
        ));
    }
}
