//! Dead-lettered delivery commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use notify_core::config::AppConfig;
use notify_core::error::AppError;
use notify_core::types::DeliveryId;
use notify_entity::delivery::Delivery;

use crate::output::{self, OutputFormat};

/// Arguments for dead-letter commands
#[derive(Debug, Args)]
pub struct DeadLetterArgs {
    #[command(subcommand)]
    pub command: DeadLetterCommand,
}

/// Dead-letter subcommands
#[derive(Debug, Subcommand)]
pub enum DeadLetterCommand {
    /// List dead-lettered deliveries, oldest first
    List {
        /// Maximum rows to show
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },
    /// Move one delivery back to the retry queue
    Requeue {
        /// Delivery ID
        delivery_id: String,
    },
    /// Move every dead-lettered delivery back to the retry queue
    RequeueAll {
        /// Maximum rows to requeue
        #[arg(short, long, default_value_t = 1000)]
        limit: i64,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Dead-letter display row
#[derive(Debug, Serialize, Tabled)]
struct DeadLetterRow {
    /// Delivery ID
    id: String,
    /// Notification ID
    notification: String,
    /// Recipient
    recipient: i64,
    /// Method
    method: String,
    /// Destination
    destination: String,
    /// Retries
    retries: i32,
    /// Last error
    error: String,
    /// Dead-lettered at
    since: String,
}

impl From<&Delivery> for DeadLetterRow {
    fn from(d: &Delivery) -> Self {
        Self {
            id: d.id.to_string(),
            notification: super::short_id(d.notification_id),
            recipient: d.recipient_id,
            method: d.delivery_method.to_string(),
            destination: d.destination.clone().unwrap_or_default(),
            retries: d.retry_count,
            error: d.error_message.clone().unwrap_or_default(),
            since: d
                .dead_lettered_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Execute dead-letter commands
pub async fn execute(
    args: &DeadLetterArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let queries = super::query_service(&pool);

    match &args.command {
        DeadLetterCommand::List { limit } => {
            let deliveries = queries.dead_letters(*limit).await?;
            let rows: Vec<DeadLetterRow> = deliveries.iter().map(DeadLetterRow::from).collect();
            output::print_list(&rows, format);
        }
        DeadLetterCommand::Requeue { delivery_id } => {
            let id: DeliveryId = delivery_id
                .parse()
                .map_err(|_| AppError::validation(format!("Invalid delivery id: {delivery_id}")))?;
            let delivery = queries.requeue(id).await?;
            output::print_success(&format!(
                "Delivery {} requeued ({} to {})",
                delivery.id,
                delivery.delivery_method,
                delivery.destination.as_deref().unwrap_or("-")
            ));
        }
        DeadLetterCommand::RequeueAll { limit, force } => {
            let pending = queries.dead_letters(*limit).await?.len();
            if pending == 0 {
                output::print_warning("No dead-lettered deliveries.");
            } else {
                let confirmed = *force
                    || dialoguer::Confirm::new()
                        .with_prompt(format!(
                            "Requeue {pending} dead-lettered deliveries for retry?"
                        ))
                        .default(false)
                        .interact()
                        .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if confirmed {
                    let requeued = queries.requeue_all(*limit).await?;
                    output::print_success(&format!("{requeued} deliveries requeued."));
                } else {
                    println!("Cancelled.");
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}
