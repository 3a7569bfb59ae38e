//! Subscription predicates over the match event stream

use serde::{Deserialize, Serialize};

use super::MatchEvent;
use crate::value_objects::{MatchMode, Snowflake, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum EventFilter {
    All,
    /// Events addressed to this user
    User(UserId),
    Pairing(Snowflake),
    Mode(MatchMode),
}

impl EventFilter {
    pub fn matches(&self, event: &MatchEvent) -> bool {
        match self {
            Self::All => true,
            Self::User(user_id) => event.recipients().contains(user_id),
            Self::Pairing(pairing_id) => event.pairing_id() == Some(*pairing_id),
            Self::Mode(mode) => event.mode() == Some(*mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PoolEnteredEvent;
    use chrono::Utc;

    #[test]
    fn test_filters() {
        let user = UserId::random();
        let event = MatchEvent::PoolEntered(PoolEnteredEvent {
            user_id: user,
            mode: MatchMode::Text,
            ticket: Snowflake::new(1),
            timestamp: Utc::now(),
        });

        assert!(EventFilter::All.matches(&event));
        assert!(EventFilter::User(user).matches(&event));
        assert!(!EventFilter::User(UserId::random()).matches(&event));
        assert!(EventFilter::Mode(MatchMode::Text).matches(&event));
        assert!(!EventFilter::Mode(MatchMode::Voice).matches(&event));
        assert!(!EventFilter::Pairing(Snowflake::new(1)).matches(&event));
    }
}
