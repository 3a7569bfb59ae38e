//! Domain errors - error types for the matchmaking domain

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Pairing not found: {0}")]
    PairingNotFound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not a participant of this pairing")]
    NotParticipant,

    // =========================================================================
    // Coordination Errors
    // =========================================================================
    /// The user already sits in an active pairing; callers route them into it.
    #[error("Already paired: {0}")]
    AlreadyPaired(Snowflake),

    /// Lost the race to claim a candidate; retried against fresh pool state.
    #[error("Pairing conflict: candidate already claimed")]
    PairingConflict,

    /// Unlock side effect attempted on a pairing that is already mutual.
    #[error("Pairing {0} is already unlocked")]
    StaleUnlockAttempt(Snowflake),

    #[error("Pairing {0} is closed")]
    PairingClosed(Snowflake),

    #[error("Decision deadline not reached for pairing {0}")]
    DeadlineNotReached(Snowflake),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    /// The backing store could not be reached. Safe to retry.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::PairingNotFound(_) => "UNKNOWN_PAIRING",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::NotParticipant => "NOT_PARTICIPANT",
            Self::AlreadyPaired(_) => "ALREADY_PAIRED",
            Self::PairingConflict => "PAIRING_CONFLICT",
            Self::StaleUnlockAttempt(_) => "STALE_UNLOCK_ATTEMPT",
            Self::PairingClosed(_) => "PAIRING_CLOSED",
            Self::DeadlineNotReached(_) => "DEADLINE_NOT_REACHED",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PairingNotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotParticipant)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyPaired(_)
                | Self::PairingConflict
                | Self::StaleUnlockAttempt(_)
                | Self::PairingClosed(_)
                | Self::DeadlineNotReached(_)
        )
    }

    /// Races the coordinator resolves on its own instead of surfacing
    pub fn is_race(&self) -> bool {
        matches!(self, Self::PairingConflict | Self::StaleUnlockAttempt(_))
    }

    /// Whether the user can safely retry the same action
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::PairingNotFound(Snowflake::new(1)).code(), "UNKNOWN_PAIRING");
        assert_eq!(DomainError::AlreadyPaired(Snowflake::new(1)).code(), "ALREADY_PAIRED");
        assert_eq!(
            DomainError::StorageUnavailable("down".into()).code(),
            "STORAGE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::PairingConflict.is_conflict());
        assert!(DomainError::PairingConflict.is_race());
        assert!(!DomainError::PairingClosed(Snowflake::new(1)).is_race());
        assert!(DomainError::StorageUnavailable("x".into()).is_retryable());
        assert!(!DomainError::DatabaseError("x".into()).is_retryable());
        assert!(DomainError::NotParticipant.is_authorization());
    }
}
