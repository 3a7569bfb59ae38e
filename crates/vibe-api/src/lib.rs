//! # vibe-api
//!
//! HTTP and WebSocket surface of the matchmaking coordinator, built on Axum.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{create_app, create_app_state, run, Server};
pub use state::AppState;
