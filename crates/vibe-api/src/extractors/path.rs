//! Path parameter extractors

use serde::Deserialize;
use vibe_core::{MatchMode, Snowflake};

use crate::response::ApiError;

/// `/pairings/:pairing_id`
#[derive(Debug, Deserialize)]
pub struct PairingIdPath {
    pub pairing_id: String,
}

impl PairingIdPath {
    pub fn pairing_id(&self) -> Result<Snowflake, ApiError> {
        self.pairing_id
            .parse()
            .map_err(|_| ApiError::invalid_path("Invalid pairing_id format"))
    }
}

/// `/match/pool/:mode`
#[derive(Debug, Deserialize)]
pub struct ModePath {
    pub mode: String,
}

impl ModePath {
    pub fn mode(&self) -> Result<MatchMode, ApiError> {
        self.mode.parse().map_err(|_| {
            ApiError::invalid_path(format!(
                "Unknown mode '{}', expected voice, video or text",
                self.mode
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_id_parse() {
        let path = PairingIdPath {
            pairing_id: "175928847299117063".to_string(),
        };
        assert_eq!(path.pairing_id().unwrap(), Snowflake::new(175_928_847_299_117_063));

        let path = PairingIdPath {
            pairing_id: "abc".to_string(),
        };
        assert_eq!(path.pairing_id().unwrap_err().error_code(), "INVALID_PATH_PARAMETER");
    }

    #[test]
    fn test_mode_parse() {
        let path = ModePath {
            mode: "voice".to_string(),
        };
        assert_eq!(path.mode().unwrap(), MatchMode::Voice);
        assert!(ModePath { mode: "VOICE".to_string() }.mode().is_err());
    }
}
