//! Schema history.
//!
//! The SQL lives in `migrations/` at the crate root and is embedded at
//! compile time. Migrations are append-only: never edit or reorder a file
//! that has shipped, add a new one instead. sqlx records applied versions in
//! `_sqlx_migrations` and runs each pending file in its own transaction.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::SqlitePool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply every pending migration.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    tracing::info!("Running database migrations...");
    MIGRATOR.run(pool).await?;
    tracing::info!(
        latest = MIGRATOR.iter().last().map(|m| m.version),
        "Database migrations completed"
    );
    Ok(())
}
