//! # Database Migrations
//!
//! Schema migrations embedded from the `migrations/` directory at build time
//! and applied through sqlx's migrator, which tracks applied versions in
//! `_sqlx_migrations` and serializes concurrent runs with an advisory lock.

use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apply every outstanding migration
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let available = MIGRATOR.iter().count();
    MIGRATOR.run(pool).await?;
    info!(migrations = available, "✅ Database schema up to date");
    Ok(())
}
