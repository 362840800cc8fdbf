//! Database migration commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use notify_core::config::AppConfig;
use notify_core::error::AppError;
use notify_database::migration::{self, MigrationState};

use crate::output::{self, OutputFormat};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply all pending migrations
    Run,
    /// Show embedded migrations and whether each is applied
    Status,
}

#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    version: i64,
    description: String,
    applied: bool,
}

impl From<MigrationState> for MigrationRow {
    fn from(m: MigrationState) -> Self {
        Self {
            version: m.version,
            description: m.description,
            applied: m.applied,
        }
    }
}

/// Execute migration commands
pub async fn execute(
    args: &MigrateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;

    let result = match &args.command {
        MigrateCommand::Run => migration::run_migrations(pool.pool()).await.map(|applied| {
            if applied == 0 {
                output::print_success("Schema already up to date.");
            } else {
                output::print_success(&format!("Applied {applied} migration(s)."));
            }
        }),
        MigrateCommand::Status => migration::migration_status(pool.pool()).await.map(|states| {
            let rows: Vec<MigrationRow> = states.into_iter().map(Into::into).collect();
            output::print_list(&rows, format);
        }),
    };

    pool.close().await;
    result
}
