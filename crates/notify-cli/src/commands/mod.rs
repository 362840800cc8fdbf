//! CLI command definitions and dispatch.

pub mod config;
pub mod dead_letter;
pub mod migrate;
pub mod notification;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use notify_core::config::AppConfig;
use notify_core::error::AppError;
use notify_database::{DatabasePool, PgDeliveryRepository, PgNotificationRepository};
use notify_service::NotificationQueryService;

use crate::output::OutputFormat;

/// School Notify operations tool
#[derive(Debug, Parser)]
#[command(name = "notify-cli", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file, without extension
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded next to the base file
    #[arg(short, long, env = "NOTIFY_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Notification inspection
    Notifications(notification::NotificationArgs),
    /// Dead-lettered delivery handling
    DeadLetters(dead_letter::DeadLetterArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load_from(&self.config, &self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config, self.format).await,
            Commands::Notifications(args) => {
                notification::execute(args, &config, self.format).await
            }
            Commands::DeadLetters(args) => dead_letter::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }
}

/// Helper: connect to the configured database
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: query service over the Postgres repositories
pub fn query_service(pool: &DatabasePool) -> Arc<NotificationQueryService> {
    Arc::new(NotificationQueryService::new(
        Arc::new(PgNotificationRepository::new(pool.pool().clone())),
        Arc::new(PgDeliveryRepository::new(pool.pool().clone())),
    ))
}

/// Helper: shorten a UUID for table display
pub fn short_id(id: impl std::fmt::Display) -> String {
    id.to_string().chars().take(8).collect()
}
