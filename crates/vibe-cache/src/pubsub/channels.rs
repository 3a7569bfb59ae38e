//! Pub/Sub channel definitions.
//!
//! Every event travels on exactly one channel so a pattern subscriber sees it once.

use vibe_core::{MatchEvent, MatchMode, Snowflake, UserId};

/// Channel prefix for user-specific notifications
pub const USER_CHANNEL_PREFIX: &str = "user:";
/// Channel prefix for pairing-scoped events
pub const PAIRING_CHANNEL_PREFIX: &str = "pairing:";
/// Channel prefix for pool activity
pub const POOL_CHANNEL_PREFIX: &str = "pool:";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Notifications for one user
    User(UserId),
    Pairing(Snowflake),
    /// Pool activity for one mode
    Pool(MatchMode),
    /// Anything that did not parse into a known channel
    Custom(String),
}

impl PubSubChannel {
    /// Channel an event is published on
    #[must_use]
    pub fn for_event(event: &MatchEvent) -> Self {
        match event {
            MatchEvent::EarnBackOffered(e) => Self::User(e.user_id),
            MatchEvent::PoolEntered(e) => Self::Pool(e.mode),
            MatchEvent::PoolLeft(e) => Self::Pool(e.mode),
            MatchEvent::PairingCreated(e) => Self::Pairing(e.pairing_id),
            MatchEvent::ConsentRecorded(e) => Self::Pairing(e.pairing_id),
            MatchEvent::PairingUnlocked(e) => Self::Pairing(e.pairing_id),
            MatchEvent::PairingAbandoned(e) => Self::Pairing(e.pairing_id),
        }
    }

    /// Glob patterns covering every channel events are published on
    #[must_use]
    pub fn patterns() -> [String; 3] {
        [
            format!("{USER_CHANNEL_PREFIX}*"),
            format!("{PAIRING_CHANNEL_PREFIX}*"),
            format!("{POOL_CHANNEL_PREFIX}*"),
        ]
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
            Self::Pairing(id) => format!("{PAIRING_CHANNEL_PREFIX}{id}"),
            Self::Pool(mode) => format!("{POOL_CHANNEL_PREFIX}{mode}"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `PubSubChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if let Some(id) = name.strip_prefix(USER_CHANNEL_PREFIX) {
            if let Ok(id) = id.parse::<UserId>() {
                return Self::User(id);
            }
        }

        if let Some(id) = name.strip_prefix(PAIRING_CHANNEL_PREFIX) {
            if let Ok(id) = id.parse::<Snowflake>() {
                return Self::Pairing(id);
            }
        }

        if let Some(mode) = name.strip_prefix(POOL_CHANNEL_PREFIX) {
            if let Ok(mode) = mode.parse::<MatchMode>() {
                return Self::Pool(mode);
            }
        }

        Self::Custom(name.to_string())
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vibe_core::events::{EarnBackOfferedEvent, PoolLeftEvent};

    #[test]
    fn test_channel_names() {
        let user = UserId::random();
        assert_eq!(PubSubChannel::User(user).name(), format!("user:{user}"));
        assert_eq!(
            PubSubChannel::Pairing(Snowflake::from(12345i64)).name(),
            "pairing:12345"
        );
        assert_eq!(PubSubChannel::Pool(MatchMode::Video).name(), "pool:video");
    }

    #[test]
    fn test_channel_parse() {
        let user = UserId::random();
        assert_eq!(
            PubSubChannel::parse(&format!("user:{user}")),
            PubSubChannel::User(user)
        );
        assert_eq!(
            PubSubChannel::parse("pairing:67890"),
            PubSubChannel::Pairing(Snowflake::from(67890i64))
        );
        assert_eq!(
            PubSubChannel::parse("pool:voice"),
            PubSubChannel::Pool(MatchMode::Voice)
        );
        assert_eq!(
            PubSubChannel::parse("pool:smoke-signals"),
            PubSubChannel::Custom("pool:smoke-signals".to_string())
        );
        assert_eq!(
            PubSubChannel::parse("user:not-a-uuid"),
            PubSubChannel::Custom("user:not-a-uuid".to_string())
        );
    }

    #[test]
    fn test_event_routing() {
        let user = UserId::random();
        let left = MatchEvent::PoolLeft(PoolLeftEvent {
            user_id: user,
            mode: MatchMode::Text,
            timestamp: Utc::now(),
        });
        assert_eq!(PubSubChannel::for_event(&left), PubSubChannel::Pool(MatchMode::Text));

        let offer = MatchEvent::EarnBackOffered(EarnBackOfferedEvent {
            pairing_id: Snowflake::from(7i64),
            user_id: user,
            coins: 3,
            action: "Watched advertisement".to_string(),
            timestamp: Utc::now(),
        });
        assert_eq!(PubSubChannel::for_event(&offer), PubSubChannel::User(user));
    }

    #[test]
    fn test_patterns_cover_routed_channels() {
        let patterns = PubSubChannel::patterns();
        for channel in [
            PubSubChannel::User(UserId::random()),
            PubSubChannel::Pairing(Snowflake::from(1i64)),
            PubSubChannel::Pool(MatchMode::Voice),
        ] {
            let name = channel.name();
            assert!(patterns
                .iter()
                .any(|p| name.starts_with(p.trim_end_matches('*'))));
        }
    }
}
