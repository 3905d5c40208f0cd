//! Versioned schema migrations
//!
//! Files in `migrations/` are applied in version order and recorded in
//! `_sqlx_migrations`, so re-running on every start is a no-op once applied.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;
use std::path::Path;
use tracing::{info, instrument};

/// Migrations shipped with this crate
pub const DEFAULT_MIGRATIONS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations");

/// Apply every pending migration from `dir` (or the crate's own directory)
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool, dir: Option<&str>) -> Result<(), MigrateError> {
    let dir = dir.unwrap_or(DEFAULT_MIGRATIONS_DIR);
    let migrator = Migrator::new(Path::new(dir)).await?;
    migrator.run(pool).await?;

    info!(
        migrations_dir = dir,
        known = migrator.iter().count(),
        "Database schema is up to date"
    );
    Ok(())
}
