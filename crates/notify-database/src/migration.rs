//! Schema migrations for the notification tables.
//!
//! The SQL files under the workspace `migrations/` directory are embedded at
//! compile time, so the server and the CLI carry the same schema.

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use notify_core::error::{AppError, ErrorKind};
use notify_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// One embedded migration and whether the database has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Apply pending migrations. Returns how many were newly applied.
pub async fn run_migrations(pool: &PgPool) -> AppResult<usize> {
    let before = applied_versions(pool).await?;
    let pending = MIGRATOR
        .iter()
        .filter(|m| !before.contains(&m.version))
        .count();
    info!(embedded = MIGRATOR.iter().count(), pending, "Applying notification schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, format!("Schema migration failed: {e}"), e)
    })?;

    info!(applied = pending, "Schema is up to date");
    Ok(pending)
}

/// Every embedded migration with its applied flag, oldest first.
pub async fn migration_status(pool: &PgPool) -> AppResult<Vec<MigrationState>> {
    let applied = applied_versions(pool).await?;
    Ok(MIGRATOR
        .iter()
        .map(|m| MigrationState {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}

async fn applied_versions(pool: &PgPool) -> AppResult<HashSet<i64>> {
    let table: Option<String> =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations')::text")
            .fetch_one(pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to inspect migration table", e))?;
    if table.is_none() {
        return Ok(HashSet::new());
    }
    let versions: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read applied migrations", e))?;
    Ok(versions.into_iter().collect())
}
