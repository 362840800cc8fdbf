//! Cron scheduler for the retry sweeper and the promoter.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use notify_core::config::SchedulerConfig;
use notify_core::error::AppError;

use crate::promoter::ScheduledPromoter;
use crate::sweeper::RetrySweeper;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Register the sweeper and promoter on their configured schedules
    pub async fn register_default_tasks(
        &self,
        config: &SchedulerConfig,
        sweeper: Arc<RetrySweeper>,
        promoter: Arc<ScheduledPromoter>,
    ) -> Result<(), AppError> {
        self.register_retry_sweep(&config.retry_cron, sweeper).await?;
        self.register_promotion(&config.promote_cron, promoter).await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Retry sweep of failed deliveries
    async fn register_retry_sweep(
        &self,
        schedule: &str,
        sweeper: Arc<RetrySweeper>,
    ) -> Result<(), AppError> {
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let sweeper = Arc::clone(&sweeper);
            Box::pin(async move {
                tracing::debug!("Running retry sweep");
                if let Err(e) = sweeper.sweep().await {
                    tracing::error!(error = %e, "Retry sweep failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid retry_cron '{}': {}", schedule, e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add retry_sweep schedule: {}", e))
        })?;

        tracing::info!(schedule = %schedule, "Registered: retry_sweep");
        Ok(())
    }

    /// Promotion of due scheduled notifications
    async fn register_promotion(
        &self,
        schedule: &str,
        promoter: Arc<ScheduledPromoter>,
    ) -> Result<(), AppError> {
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let promoter = Arc::clone(&promoter);
            Box::pin(async move {
                if let Err(e) = promoter.promote().await {
                    tracing::error!(error = %e, "Promotion of scheduled notifications failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid promote_cron '{}': {}", schedule, e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add promotion schedule: {}", e))
        })?;

        tracing::info!(schedule = %schedule, "Registered: promote_scheduled");
        Ok(())
    }
}
