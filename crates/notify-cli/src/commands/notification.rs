//! Notification inspection commands.

use clap::{Args, Subcommand};

use notify_core::config::AppConfig;
use notify_core::error::AppError;
use notify_core::types::NotificationId;

use crate::output::{self, OutputFormat};

/// Arguments for notification commands
#[derive(Debug, Args)]
pub struct NotificationArgs {
    #[command(subcommand)]
    pub command: NotificationCommand,
}

/// Notification subcommands
#[derive(Debug, Subcommand)]
pub enum NotificationCommand {
    /// Show delivery statistics for one notification
    Stats {
        /// Notification ID
        id: String,
    },
}

/// Execute notification commands
pub async fn execute(
    args: &NotificationArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let queries = super::query_service(&pool);

    match &args.command {
        NotificationCommand::Stats { id } => {
            let id: NotificationId = id
                .parse()
                .map_err(|_| AppError::validation(format!("Invalid notification id: {id}")))?;
            let notification = queries.get(id).await?;
            let stats = queries.statistics(id).await?;

            match format {
                OutputFormat::Json => output::print_json(&serde_json::json!({
                    "notification": notification,
                    "statistics": stats,
                })),
                OutputFormat::Table => {
                    println!("{}", notification.title);
                    output::print_kv("Status", notification.status);
                    output::print_kv("Type", notification.notification_type);
                    output::print_kv("Audience", notification.target_audience);
                    output::print_kv("Total", stats.total);
                    output::print_kv("Successful", stats.successful);
                    output::print_kv("Sent", stats.sent);
                    output::print_kv("Failed", stats.failed);
                    output::print_kv("Pending", stats.pending);
                    output::print_kv("Dead-lettered", stats.dead_lettered);
                    output::print_kv("Success rate", format!("{:.1}%", stats.success_rate));
                    if let Some(reason) = &notification.failure_reason {
                        output::print_kv("Failure reason", reason);
                    }
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}
