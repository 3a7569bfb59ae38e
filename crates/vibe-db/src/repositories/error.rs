//! Error handling utilities for stores

use sqlx::Error as SqlxError;
use vibe_core::DomainError;

/// SQLSTATE serialization_failure
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE deadlock_detected
const DEADLOCK_DETECTED: &str = "40P01";

/// Convert SQLx error to DomainError
///
/// Connectivity failures become [`DomainError::StorageUnavailable`] so callers
/// can tell the user to retry; lost transaction races become
/// [`DomainError::PairingConflict`].
pub fn map_db_error(e: SqlxError) -> DomainError {
    match &e {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) | SqlxError::Tls(_) => {
            DomainError::StorageUnavailable(e.to_string())
        }
        SqlxError::Database(db_err)
            if matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
            ) =>
        {
            DomainError::PairingConflict
        }
        _ => DomainError::DatabaseError(e.to_string()),
    }
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce() -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    map_db_error(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_errors_are_retryable() {
        assert!(map_db_error(SqlxError::PoolTimedOut).is_retryable());
        assert!(map_db_error(SqlxError::PoolClosed).is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(map_db_error(SqlxError::Io(io)).is_retryable());
    }

    #[test]
    fn test_other_errors_are_database_errors() {
        assert!(matches!(
            map_db_error(SqlxError::RowNotFound),
            DomainError::DatabaseError(_)
        ));
        assert!(matches!(
            map_unique_violation(SqlxError::RowNotFound, || DomainError::PairingConflict),
            DomainError::DatabaseError(_)
        ));
    }
}
