//! School Notify server
//!
//! Main entry point: loads configuration, initializes logging, prepares the
//! database and hands over to the API crate's server loop.

use tracing_subscriber::{EnvFilter, fmt};

use notify_core::config::{AppConfig, LogFormat};
use notify_core::error::AppError;
use notify_database::DatabasePool;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "School Notify stopped with an error");
        std::process::exit(1);
    }
}

/// Load configuration from `NOTIFY_CONFIG` (base file, no extension),
/// the `NOTIFY_ENV` overlay, and `NOTIFY__*` variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let base = std::env::var("NOTIFY_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("NOTIFY_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_from(&base, &env)
}

/// Install the global subscriber. `RUST_LOG`, when set, replaces the
/// configured directives entirely.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter_directives()));
    let builder = fmt().with_env_filter(filter).with_target(true);

    match config.logging.format {
        LogFormat::Json => builder.json().with_current_span(false).init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting School Notify");

    let db_pool = DatabasePool::connect(&config.database).await?;

    if config.database.run_migrations {
        notify_database::migration::run_migrations(db_pool.pool()).await?;
    } else {
        tracing::warn!("Automatic migrations disabled; run `notify-cli migrate run` before serving");
    }

    notify_api::run_server(config, db_pool).await
}
