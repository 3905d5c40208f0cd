//! # warden-db
//!
//! Storage layer implementing the repository traits of `warden-core`.
//!
//! ## Overview
//!
//! - Connection pool management and versioned migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - PostgreSQL repository implementations
//! - An in-memory store implementing the same ports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use warden_db::repositories::PgInfractionRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool, None).await?;
//!     let infractions = PgInfractionRepository::new(pool);
//!
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{MemoryStore, Outage};
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool, DEFAULT_MIGRATIONS_DIR};
pub use repositories::{
    PgGuildSettingsRepository, PgInfractionRepository, PgLockRepository, PgMuteRepository,
    PgPardonRepository, PgPublishedMessageRepository,
};
