//! Entity to DTO conversions

use chrono::{DateTime, Utc};
use vibe_core::{Pairing, Side, UserId, WaitingEntry};

use super::responses::{
    AbandonResponse, ConsentResponse, MatchStatusResponse, PairingResponse, PoolEntryResponse,
    PoolSnapshotResponse, WaitingResponse,
};
use crate::services::{AbandonResult, MatchStatus, VoteResult};

impl From<&WaitingEntry> for WaitingResponse {
    fn from(entry: &WaitingEntry) -> Self {
        Self {
            mode: entry.mode,
            ticket: entry.ticket,
            enqueued_at: entry.enqueued_at,
        }
    }
}

impl From<&WaitingEntry> for PoolEntryResponse {
    fn from(entry: &WaitingEntry) -> Self {
        Self {
            user_id: entry.user_id,
            ticket: entry.ticket,
            enqueued_at: entry.enqueued_at,
        }
    }
}

impl PoolSnapshotResponse {
    pub fn new(mode: vibe_core::MatchMode, entries: &[WaitingEntry]) -> Self {
        Self {
            mode,
            count: entries.len(),
            entries: entries.iter().map(PoolEntryResponse::from).collect(),
        }
    }
}

impl PairingResponse {
    /// Render `pairing` as `viewer` sees it. Callers have already checked
    /// that `viewer` is a participant.
    pub fn for_viewer(pairing: &Pairing, viewer: UserId, now: DateTime<Utc>) -> Self {
        let side = pairing.side_of(viewer).unwrap_or(Side::A);
        let remaining_ms = if pairing.is_active() {
            pairing.remaining(now).num_milliseconds()
        } else {
            0
        };

        Self {
            id: pairing.id,
            mode: pairing.mode,
            status: pairing.status,
            side,
            counterpart: pairing.participant(side.other()),
            your_consent: pairing.consent(side),
            their_consent: pairing.consent(side.other()),
            created_at: pairing.created_at,
            decision_deadline: pairing.decision_deadline,
            remaining_ms,
            unlocked_at: pairing.unlocked_at,
            rtc_channel: pairing.rtc_channel.clone(),
            ended_at: pairing.ended_at,
            end_reason: pairing.end_reason,
            closed_by: pairing.closed_by,
        }
    }
}

impl MatchStatusResponse {
    pub fn for_viewer(status: &MatchStatus, viewer: UserId, now: DateTime<Utc>) -> Self {
        match status {
            MatchStatus::Idle => Self::Idle,
            MatchStatus::Waiting { entry } => Self::Waiting {
                entry: entry.into(),
            },
            MatchStatus::Paired { pairing } => Self::Paired {
                pairing: PairingResponse::for_viewer(pairing, viewer, now),
            },
        }
    }
}

impl ConsentResponse {
    pub fn for_viewer(result: &VoteResult, viewer: UserId, now: DateTime<Utc>) -> Self {
        Self {
            pairing: PairingResponse::for_viewer(&result.pairing, viewer, now),
            outcome: result.outcome,
        }
    }
}

impl AbandonResponse {
    pub fn for_viewer(result: &AbandonResult, viewer: UserId, now: DateTime<Utc>) -> Self {
        Self {
            pairing: PairingResponse::for_viewer(&result.pairing, viewer, now),
            penalty: result.penalty.clone(),
        }
    }
}
