//! The shared PostgreSQL pool.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use notify_core::config::DatabaseConfig;
use notify_core::error::{AppError, ErrorKind};
use notify_core::result::AppResult;

/// Cloneable handle to the sqlx pool used by every repository.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let sizing = &config.pool;
        info!(
            url = %mask_password(&config.url),
            max = sizing.max_connections,
            min = sizing.min_connections,
            "Opening PostgreSQL pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(sizing.max_connections)
            .min_connections(sizing.min_connections)
            .acquire_timeout(sizing.acquire_timeout())
            .idle_timeout(sizing.idle_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Cannot reach notification database: {e}"),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    /// The sqlx pool, for repositories and migrations.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trips `SELECT 1`. Used by the health endpoint.
    pub async fn health_check(&self) -> AppResult<bool> {
        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Database ping failed", e))?;
        Ok(one == 1)
    }

    /// Wait for checked-out connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(target: "notify::shutdown", "PostgreSQL pool closed");
    }
}

/// Replace the password in a connection URL with `****`.
///
/// The last `@` ends the userinfo, so passwords containing `@` are masked
/// whole. URLs without a password come back unchanged.
pub fn mask_password(url: &str) -> String {
    let authority_start = url.find("://").map_or(0, |i| i + 3);
    let rest = &url[authority_start..];
    let Some(at) = rest.rfind('@') else {
        return url.to_string();
    };
    let userinfo = &rest[..at];
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{}{user}:****{}", &url[..authority_start], &rest[at..]),
        None => url.to_string(),
    }
}
