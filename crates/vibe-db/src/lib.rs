//! # vibe-db
//!
//! Storage layer implementing the matchmaking store ports.
//!
//! ## Overview
//!
//! - Connection pool management and embedded migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity <-> model mappers
//! - PostgreSQL stores whose every mutation is a single conditional statement
//!   or a short transaction under per-user advisory locks
//! - [`MemoryMatchStore`], a mutex-guarded store with the same semantics for
//!   single-process deployments and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vibe_db::{create_pool, run_migrations, PgPairingStore, PoolConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::from_env()).await?;
//!     run_migrations(&pool).await?;
//!     let pairings = PgPairingStore::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryMatchStore;
pub use migrations::run_migrations;
pub use pool::{create_pool, create_pool_from_env, PgPool, PoolConfig};
pub use repositories::{PgLedger, PgPairingStore, PgWaitingPoolStore};
