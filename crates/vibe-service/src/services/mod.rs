//! Matchmaking services
//!
//! Each service borrows the shared [`MatchContext`] and is cheap to build per call.

pub mod arbiter;
pub mod consent;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod pool;
pub mod sweeper;

pub use arbiter::{PairOutcome, PairingArbiter};
pub use consent::{AbandonResult, ConsentOutcome, ConsentTracker, PenaltyOutcome, VoteResult};
pub use context::{MatchContext, MatchContextBuilder};
pub use coordinator::MatchCoordinator;
pub use error::{ServiceError, ServiceResult};
pub use pool::{MatchStatus, PoolManager};
pub use sweeper::{DeadlineSweeper, SweepReport};
