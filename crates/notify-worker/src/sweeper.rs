//! Retry sweeper: gives failed deliveries another attempt and dead-letters
//! those that run out of retries.

use std::sync::Arc;

use serde::Serialize;

use notify_channel::ChannelRegistry;
use notify_core::result::AppResult;
use notify_database::{DeliveryStore, NotificationStore};
use notify_entity::delivery::{Delivery, DeliveryMethod, DeliveryStatus};
use notify_service::{RecipientResolver, ResolveError};

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: usize,
    pub delivered: usize,
    /// Failed again with retries left.
    pub failed: usize,
    pub dead_lettered: usize,
    /// Not attempted; no retry consumed.
    pub skipped: usize,
}

enum RetryResult {
    Delivered,
    Failed,
    DeadLettered,
    Skipped,
}

/// Periodic resend of `FAILED` deliveries.
#[derive(Clone)]
pub struct RetrySweeper {
    notifications: Arc<dyn NotificationStore>,
    deliveries: Arc<dyn DeliveryStore>,
    resolver: RecipientResolver,
    channels: Arc<ChannelRegistry>,
    max_retries: i32,
    batch_size: i64,
}

impl std::fmt::Debug for RetrySweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrySweeper")
            .field("max_retries", &self.max_retries)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl RetrySweeper {
    /// Create a new sweeper
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        deliveries: Arc<dyn DeliveryStore>,
        resolver: RecipientResolver,
        channels: Arc<ChannelRegistry>,
        max_retries: i32,
        batch_size: i64,
    ) -> Self {
        Self {
            notifications,
            deliveries,
            resolver,
            channels,
            max_retries,
            batch_size,
        }
    }

    /// Run one sweep.
    ///
    /// A directory outage ends the sweep early; the remaining rows are
    /// reported as skipped and keep their retry count.
    pub async fn sweep(&self) -> AppResult<SweepReport> {
        let rows = self
            .deliveries
            .find_retryable(self.max_retries, self.batch_size)
            .await?;
        let mut report = SweepReport {
            examined: rows.len(),
            ..SweepReport::default()
        };
        if rows.is_empty() {
            tracing::debug!("Retry sweep found nothing to do");
            return Ok(report);
        }

        let mut attempted = false;
        for (i, delivery) in rows.iter().enumerate() {
            match self.retry_one(delivery, &mut attempted).await {
                Ok(RetryResult::Delivered) => report.delivered += 1,
                Ok(RetryResult::Failed) => report.failed += 1,
                Ok(RetryResult::DeadLettered) => report.dead_lettered += 1,
                Ok(RetryResult::Skipped) => report.skipped += 1,
                Err(SweepError::Directory(e)) => {
                    report.skipped += rows.len() - i;
                    tracing::warn!(error = %e, skipped = rows.len() - i, "Directory unavailable; sweep stopped");
                    break;
                }
                Err(SweepError::Store(e)) => return Err(e),
            }
        }

        tracing::info!(
            examined = report.examined,
            delivered = report.delivered,
            failed = report.failed,
            dead_lettered = report.dead_lettered,
            skipped = report.skipped,
            "Retry sweep finished"
        );
        Ok(report)
    }

    async fn retry_one(&self, delivery: &Delivery, attempted: &mut bool) -> Result<RetryResult, SweepError> {
        if delivery.delivery_method == DeliveryMethod::InApp {
            self.deliveries.mark_delivered(delivery.id).await?;
            return Ok(RetryResult::Delivered);
        }

        let Some(channel) = self.channels.get(delivery.delivery_method) else {
            let reason = format!("no channel registered for {}", delivery.delivery_method);
            return self.record_failure(delivery, &reason).await;
        };

        let Some(notification) = self.notifications.find_by_id(delivery.notification_id).await? else {
            return Ok(RetryResult::Skipped);
        };

        let contact = self
            .resolver
            .resolve_one(delivery.recipient_id, delivery.recipient_type)
            .await
            .map_err(SweepError::Directory)?;
        let Some(contact) = contact else {
            return self.record_failure(delivery, "recipient no longer in directory").await;
        };
        let Some(destination) = channel.destination(&contact) else {
            let reason = format!("recipient has no usable {} address", delivery.delivery_method);
            return self.record_failure(delivery, &reason).await;
        };

        if *attempted && !channel.pacing().is_zero() {
            tokio::time::sleep(channel.pacing()).await;
        }
        *attempted = true;

        let message = channel.render(&notification, &contact);
        match channel.send(&destination, &message).await {
            Ok(_) => {
                self.deliveries.mark_delivered(delivery.id).await?;
                tracing::info!(
                    delivery_id = %delivery.id,
                    method = %delivery.delivery_method,
                    retry_count = delivery.retry_count,
                    "Retry delivered"
                );
                Ok(RetryResult::Delivered)
            }
            Err(e) => self.record_failure(delivery, &e.to_string()).await,
        }
    }

    async fn record_failure(&self, delivery: &Delivery, error: &str) -> Result<RetryResult, SweepError> {
        let updated = self
            .deliveries
            .record_retry_failure(delivery.id, error, self.max_retries)
            .await?;

        if updated.status == DeliveryStatus::DeadLettered {
            tracing::error!(
                target: "notify::dead_letter",
                delivery_id = %updated.id,
                notification_id = %updated.notification_id,
                recipient_id = updated.recipient_id,
                method = %updated.delivery_method,
                retry_count = updated.retry_count,
                error = %error,
                "Delivery dead-lettered after exhausting retries"
            );
            return Ok(RetryResult::DeadLettered);
        }

        tracing::warn!(
            delivery_id = %updated.id,
            method = %updated.delivery_method,
            retry_count = updated.retry_count,
            error = %error,
            "Retry failed"
        );
        Ok(RetryResult::Failed)
    }
}

#[derive(Debug, thiserror::Error)]
enum SweepError {
    #[error(transparent)]
    Directory(ResolveError),
    #[error(transparent)]
    Store(#[from] notify_core::AppError),
}
