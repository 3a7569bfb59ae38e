//! HTTP and WebSocket handlers

pub mod events;
pub mod health;
pub mod matching;
pub mod pairings;
