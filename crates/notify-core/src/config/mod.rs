//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod channels;
pub mod database;
pub mod directory;
pub mod logging;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::channels::{ChannelsConfig, EmailConfig, InAppConfig, SmsConfig, WhatsAppConfig};
pub use self::database::{DatabaseConfig, PoolConfig};
pub use self::directory::DirectoryConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::worker::{SchedulerConfig, WorkerConfig};

use crate::error::AppError;

/// Prefix for environment variable overrides (`NOTIFY__DATABASE__URL`).
const ENV_PREFIX: &str = "NOTIFY";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Student directory settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Outbound channel provider settings.
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Dispatch worker pool settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Retry sweeper and promoter schedules.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from `config/default.toml`, the `config/{env}.toml`
    /// overlay, and `NOTIFY__*` environment variables.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", env)
    }

    /// Load configuration using an explicit base file path (without extension).
    ///
    /// The environment overlay is looked up next to the base file.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let overlay = match base.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{env}"),
            None => env.to_string(),
        };

        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&overlay).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
