//! Integration test utilities for the matchmaking server
//!
//! Spawns the real Axum server on a free local port with in-process backends
//! and drives it over HTTP and WebSocket.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
