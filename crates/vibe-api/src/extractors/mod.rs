//! Axum extractors for request handling

mod auth;
mod path;
mod validated;

pub use auth::AuthUser;
pub use path::{ModePath, PairingIdPath};
pub use validated::{ValidatedJson, ValidatedQuery};
