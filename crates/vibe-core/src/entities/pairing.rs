//! Pairing entity - two users shown to each other, each deciding whether to vibe
//!
//! Status only moves forward: `active -> mutual` or `active -> abandoned`.
//! The transition helpers below are conditional; they report whether they
//! changed anything so stores can implement compare-and-set on top of them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MatchMode, Snowflake, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingStatus {
    Active,
    Mutual,
    Abandoned,
}

impl PairingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Mutual => "mutual",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "mutual" => Some(Self::Mutual),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
    /// A participant pressed skip (or cancelled after being paired)
    Skipped,
    /// The decision window elapsed without both votes
    TimedOut,
}

impl AbandonReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "skipped" => Some(Self::Skipped),
            "timed_out" => Some(Self::TimedOut),
            _ => None,
        }
    }
}

/// Which seat a participant occupies in a pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Result of a conditional consent write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentWrite {
    /// The flag flipped from false to true
    Recorded(Pairing),
    /// The flag was already set; nothing changed
    AlreadyRecorded(Pairing),
    /// The pairing is no longer active; nothing changed
    Closed(Pairing),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub id: Snowflake,
    /// The older waiter, whose entry was claimed as the candidate
    pub participant_a: UserId,
    /// The user whose arbiter pass created the pairing
    pub participant_b: UserId,
    pub mode: MatchMode,
    pub consent_a: bool,
    pub consent_b: bool,
    pub status: PairingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Fixed at creation; partial consent never moves it
    pub decision_deadline: DateTime<Utc>,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub rtc_channel: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub end_reason: Option<AbandonReason>,
    pub closed_by: Option<UserId>,
}

impl Pairing {
    pub fn new(
        id: Snowflake,
        participant_a: UserId,
        participant_b: UserId,
        mode: MatchMode,
        now: DateTime<Utc>,
        decision_window: Duration,
    ) -> Self {
        Self {
            id,
            participant_a,
            participant_b,
            mode,
            consent_a: false,
            consent_b: false,
            status: PairingStatus::Active,
            created_at: now,
            updated_at: now,
            decision_deadline: now + decision_window,
            unlocked_at: None,
            rtc_channel: None,
            ended_at: None,
            end_reason: None,
            closed_by: None,
        }
    }

    /// Media channel handed to the RTC provider on unlock. Text pairings have none.
    pub fn rtc_channel_for(id: Snowflake, mode: MatchMode) -> Option<String> {
        mode.uses_media().then(|| format!("vibe-{mode}-{id}"))
    }

    pub fn participants(&self) -> [UserId; 2] {
        [self.participant_a, self.participant_b]
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    pub fn side_of(&self, user_id: UserId) -> Option<Side> {
        if self.participant_a == user_id {
            Some(Side::A)
        } else if self.participant_b == user_id {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn participant(&self, side: Side) -> UserId {
        match side {
            Side::A => self.participant_a,
            Side::B => self.participant_b,
        }
    }

    pub fn counterpart_of(&self, user_id: UserId) -> Option<UserId> {
        self.side_of(user_id).map(|side| self.participant(side.other()))
    }

    pub fn consent(&self, side: Side) -> bool {
        match side {
            Side::A => self.consent_a,
            Side::B => self.consent_b,
        }
    }

    /// Conversation unlock condition
    pub fn both_consented(&self) -> bool {
        self.consent_a && self.consent_b
    }

    pub fn is_active(&self) -> bool {
        self.status == PairingStatus::Active
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now >= self.decision_deadline
    }

    /// Time left on the decision countdown, floored at zero
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.decision_deadline - now).max(Duration::zero())
    }

    // =========================================================================
    // Conditional transitions
    // =========================================================================

    /// Set `side`'s consent flag if the pairing is active and the flag is unset.
    pub fn record_consent(&mut self, side: Side, now: DateTime<Utc>) -> bool {
        if !self.is_active() || self.consent(side) {
            return false;
        }
        match side {
            Side::A => self.consent_a = true,
            Side::B => self.consent_b = true,
        }
        self.updated_at = now;
        true
    }

    /// `active -> mutual`, only when both flags are set.
    pub fn mark_mutual(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active() || !self.both_consented() {
            return false;
        }
        self.status = PairingStatus::Mutual;
        self.unlocked_at = Some(now);
        self.rtc_channel = Self::rtc_channel_for(self.id, self.mode);
        self.updated_at = now;
        true
    }

    /// `active -> abandoned`. A timeout is refused before the deadline.
    pub fn mark_abandoned(
        &mut self,
        reason: AbandonReason,
        closed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.is_active() {
            return false;
        }
        if reason == AbandonReason::TimedOut && !self.deadline_passed(now) {
            return false;
        }
        self.status = PairingStatus::Abandoned;
        self.end_reason = Some(reason);
        self.closed_by = closed_by;
        self.ended_at = Some(now);
        self.updated_at = now;
        true
    }
}
