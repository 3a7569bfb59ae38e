//! Response shapes as clients see them

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct MatchRequest {
    pub mode: String,
}

impl MatchRequest {
    pub fn voice() -> Self {
        Self::mode("voice")
    }

    pub fn mode(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WaitingView {
    pub mode: String,
    pub ticket: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairingView {
    pub id: String,
    pub mode: String,
    pub status: String,
    pub side: String,
    pub counterpart: String,
    pub your_consent: bool,
    pub their_consent: bool,
    pub remaining_ms: i64,
    #[serde(default)]
    pub rtc_channel: Option<String>,
    #[serde(default)]
    pub end_reason: Option<String>,
    #[serde(default)]
    pub closed_by: Option<String>,
}

/// `{ "state": "idle" | "waiting" | "paired", ... }`
#[derive(Debug, Deserialize)]
pub struct StatusView {
    pub state: String,
    #[serde(default)]
    pub entry: Option<WaitingView>,
    #[serde(default)]
    pub pairing: Option<PairingView>,
}

impl StatusView {
    pub fn paired(&self) -> Option<&PairingView> {
        self.pairing.as_ref().filter(|_| self.state == "paired")
    }
}

#[derive(Debug, Deserialize)]
pub struct ConsentView {
    #[serde(flatten)]
    pub pairing: PairingView,
    pub outcome: String,
}

#[derive(Debug, Deserialize)]
pub struct AbandonView {
    #[serde(flatten)]
    pub pairing: PairingView,
    pub penalty: Value,
}

#[derive(Debug, Deserialize)]
pub struct PoolView {
    pub mode: String,
    pub count: usize,
    pub entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorView {
    pub error: ErrorDetailView,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetailView {
    pub code: String,
    pub message: String,
}
