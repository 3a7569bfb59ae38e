//! # vibe-service
//!
//! Application layer: the matchmaking coordinator and its DTOs.
//!
//! - [`PoolManager`] tracks who is waiting for which mode
//! - [`PairingArbiter`] claims two waiters and creates the pairing
//! - [`ConsentTracker`] drives each pairing to `mutual` or `abandoned`
//! - [`DeadlineSweeper`] expires pairings whose clients went quiet
//! - [`MatchCoordinator`] composes the above for the API

pub mod dto;
pub mod services;

pub use services::{
    AbandonResult, ConsentOutcome, ConsentTracker, DeadlineSweeper, MatchContext,
    MatchContextBuilder, MatchCoordinator, MatchStatus, PairOutcome, PairingArbiter,
    PenaltyOutcome, PoolManager, ServiceError, ServiceResult, SweepReport, VoteResult,
};
