//! Data transfer objects for the HTTP surface
//!
//! - Request DTOs with validation for API inputs
//! - Response DTOs rendered from the viewer's side of a pairing

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{MatchRequest, PoolQuery, WaitQuery};
pub use responses::{
    AbandonResponse, ConsentResponse, HealthChecks, HealthResponse, MatchStatusResponse,
    PairingResponse, PoolEntryResponse, PoolSnapshotResponse, ReadinessResponse, WaitingResponse,
};
