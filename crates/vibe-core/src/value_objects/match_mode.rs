//! MatchMode - the communication mode a user is searching for

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Voice,
    Video,
    Text,
}

impl MatchMode {
    pub const ALL: [MatchMode; 3] = [Self::Voice, Self::Video, Self::Text];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Video => "video",
            Self::Text => "text",
        }
    }

    /// Whether an unlocked pairing hands off to the real-time media provider
    pub const fn uses_media(&self) -> bool {
        matches!(self, Self::Voice | Self::Video)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown match mode: {0}")]
pub struct MatchModeParseError(pub String);

impl FromStr for MatchMode {
    type Err = MatchModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voice" => Ok(Self::Voice),
            "video" => Ok(Self::Video),
            "text" => Ok(Self::Text),
            other => Err(MatchModeParseError(other.to_string())),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
