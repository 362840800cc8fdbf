//! Dispatch worker and periodic task configuration.

use serde::{Deserialize, Serialize};

/// Dispatch worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker pool is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of notifications dispatched concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Capacity of the in-process dispatch queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Seconds to wait for in-flight dispatches on shutdown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

/// Retry sweeper and scheduled-notification promoter configuration.
///
/// Cron expressions use the six-field `sec min hour day month weekday`
/// syntax understood by `tokio-cron-scheduler`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the periodic tasks are registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Schedule of the retry sweeper.
    #[serde(default = "default_retry_cron")]
    pub retry_cron: String,
    /// Schedule of the scheduled-notification promoter.
    #[serde(default = "default_promote_cron")]
    pub promote_cron: String,
    /// Retry ceiling per delivery; reaching it dead-letters the delivery.
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
    /// Maximum number of failed deliveries examined per sweep.
    #[serde(default = "default_sweep_batch")]
    pub sweep_batch_size: i64,
    /// Age after which an unscheduled notification still in SCHEDULED is re-dispatched.
    #[serde(default = "default_stale_after")]
    pub stale_after_seconds: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry_cron: default_retry_cron(),
            promote_cron: default_promote_cron(),
            max_retries: default_max_retries(),
            sweep_batch_size: default_sweep_batch(),
            stale_after_seconds: default_stale_after(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_retry_cron() -> String {
    "0 */5 * * * *".to_string()
}

fn default_promote_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_max_retries() -> i32 {
    3
}

fn default_sweep_batch() -> i64 {
    500
}

fn default_stale_after() -> i64 {
    300
}
