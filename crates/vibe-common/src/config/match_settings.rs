//! Matchmaking rules: countdowns, retry bounds and ledger amounts

use chrono::Duration;
use serde::Deserialize;

use super::app_config::{var_or, ConfigError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchSettings {
    /// Seconds each pairing has for both sides to vibe
    pub decision_window_secs: i64,
    /// Slack the server sweeper leaves for client countdowns to fire first
    pub expiry_grace_secs: i64,
    pub sweep_interval_secs: u64,
    /// Waiting entries older than this are purged
    pub pool_entry_ttl_secs: i64,
    /// Arbiter passes before degrading to "stay waiting"
    pub max_pair_attempts: u32,
    pub pair_backoff_ms: u64,
    pub skip_cost: i64,
    pub earn_back_reward: i64,
    pub unlock_xp: i64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            decision_window_secs: 30,
            expiry_grace_secs: 2,
            sweep_interval_secs: 1,
            pool_entry_ttl_secs: 300,
            max_pair_attempts: 3,
            pair_backoff_ms: 25,
            skip_cost: 1,
            earn_back_reward: 3,
            unlock_xp: 10,
        }
    }
}

impl MatchSettings {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            decision_window_secs: var_or("MATCH_DECISION_WINDOW_SECS", || d.decision_window_secs)?,
            expiry_grace_secs: var_or("MATCH_EXPIRY_GRACE_SECS", || d.expiry_grace_secs)?,
            sweep_interval_secs: var_or("MATCH_SWEEP_INTERVAL_SECS", || d.sweep_interval_secs)?,
            pool_entry_ttl_secs: var_or("MATCH_POOL_ENTRY_TTL_SECS", || d.pool_entry_ttl_secs)?,
            max_pair_attempts: var_or("MATCH_MAX_PAIR_ATTEMPTS", || d.max_pair_attempts)?,
            pair_backoff_ms: var_or("MATCH_PAIR_BACKOFF_MS", || d.pair_backoff_ms)?,
            skip_cost: var_or("MATCH_SKIP_COST", || d.skip_cost)?,
            earn_back_reward: var_or("MATCH_EARN_BACK_REWARD", || d.earn_back_reward)?,
            unlock_xp: var_or("MATCH_UNLOCK_XP", || d.unlock_xp)?,
        })
    }

    /// # Errors
    /// Returns an error when a window or bound would stall matching
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decision_window_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "MATCH_DECISION_WINDOW_SECS",
                self.decision_window_secs.to_string(),
            ));
        }
        if self.pool_entry_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "MATCH_POOL_ENTRY_TTL_SECS",
                self.pool_entry_ttl_secs.to_string(),
            ));
        }
        if self.max_pair_attempts == 0 {
            return Err(ConfigError::InvalidValue("MATCH_MAX_PAIR_ATTEMPTS", "0".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue("MATCH_SWEEP_INTERVAL_SECS", "0".into()));
        }
        if self.skip_cost < 0
            || self.earn_back_reward < 0
            || self.unlock_xp < 0
            || self.expiry_grace_secs < 0
        {
            return Err(ConfigError::InvalidValue(
                "MATCH_*",
                "amounts and grace must not be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn decision_window(&self) -> Duration {
        Duration::seconds(self.decision_window_secs)
    }

    pub fn expiry_grace(&self) -> Duration {
        Duration::seconds(self.expiry_grace_secs)
    }

    pub fn pool_entry_ttl(&self) -> Duration {
        Duration::seconds(self.pool_entry_ttl_secs)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn pair_backoff(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.pair_backoff_ms)
    }
}
