//! Configuration inspection commands.

use clap::{Args, Subcommand};

use notify_core::config::AppConfig;
use notify_core::error::AppError;
use notify_database::connection::mask_password;

use crate::output::{self, OutputFormat};

const MASK: &str = "****";

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets masked
    Show,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = redacted(config);
            match format {
                OutputFormat::Json => output::print_json(&config),
                OutputFormat::Table => print_summary(&config),
            }
        }
    }
    Ok(())
}

fn redacted(config: &AppConfig) -> AppConfig {
    let mut config = config.clone();
    config.database.url = mask_password(&config.database.url);
    let channels = &mut config.channels;
    if !channels.sms.auth_token.is_empty() {
        channels.sms.auth_token = MASK.to_string();
    }
    if !channels.whatsapp.access_token.is_empty() {
        channels.whatsapp.access_token = MASK.to_string();
    }
    if channels.email.password.is_some() {
        channels.email.password = Some(MASK.to_string());
    }
    config
}

fn print_summary(config: &AppConfig) {
    let enabled = |on: bool| if on { "enabled" } else { "disabled" };
    output::print_kv("Server", config.server.bind_addr());
    output::print_kv("Database", &config.database.url);
    output::print_kv("Directory", &config.directory.base_url);
    output::print_kv("School", &config.channels.school_name);
    output::print_kv("Country code", &config.channels.country_code);
    output::print_kv("SMS", enabled(config.channels.sms.enabled));
    output::print_kv("WhatsApp", enabled(config.channels.whatsapp.enabled));
    output::print_kv("Email", enabled(config.channels.email.enabled));
    output::print_kv("In-app", enabled(config.channels.in_app.enabled));
    output::print_kv(
        "Workers",
        format!(
            "{} x{} (queue {})",
            enabled(config.worker.enabled),
            config.worker.concurrency,
            config.worker.queue_capacity
        ),
    );
    output::print_kv("Retry sweep", &config.scheduler.retry_cron);
    output::print_kv("Promotion", &config.scheduler.promote_cron);
    output::print_kv("Max retries", config.scheduler.max_retries);
    output::print_kv(
        "Log",
        format!("{} ({:?})", config.logging.filter_directives(), config.logging.format),
    );
}
