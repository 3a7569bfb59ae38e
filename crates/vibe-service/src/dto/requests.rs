//! Request DTOs for API endpoints

use serde::Deserialize;
use validator::Validate;
use vibe_core::MatchMode;

/// Pool snapshot size when the caller does not ask for one
pub const DEFAULT_POOL_LIMIT: i64 = 50;
/// Long-poll duration when the caller does not ask for one
pub const DEFAULT_WAIT_SECS: u64 = 20;

/// Start searching for a counterpart
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MatchRequest {
    pub mode: MatchMode,
}

/// `GET /match/pool/:mode` query string
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PoolQuery {
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl PoolQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_POOL_LIMIT)
    }
}

/// `GET /match/wait` query string: how long to hold the request open
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WaitQuery {
    #[validate(range(min = 1, max = 30, message = "timeout_secs must be between 1 and 30"))]
    pub timeout_secs: Option<u64>,
}

impl WaitQuery {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_WAIT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_request_parses_mode() {
        let req: MatchRequest = serde_json::from_str(r#"{"mode":"video"}"#).unwrap();
        assert_eq!(req.mode, MatchMode::Video);
        assert!(serde_json::from_str::<MatchRequest>(r#"{"mode":"fax"}"#).is_err());
    }

    #[test]
    fn test_pool_query_limits() {
        assert_eq!(PoolQuery::default().limit(), DEFAULT_POOL_LIMIT);
        assert!(PoolQuery { limit: Some(100) }.validate().is_ok());
        assert!(PoolQuery { limit: Some(0) }.validate().is_err());
        assert!(PoolQuery { limit: Some(101) }.validate().is_err());
    }

    #[test]
    fn test_wait_query_bounds() {
        assert_eq!(WaitQuery::default().timeout().as_secs(), DEFAULT_WAIT_SECS);
        assert!(WaitQuery { timeout_secs: Some(30) }.validate().is_ok());
        assert!(WaitQuery { timeout_secs: Some(0) }.validate().is_err());
        assert!(WaitQuery { timeout_secs: Some(31) }.validate().is_err());
    }
}
