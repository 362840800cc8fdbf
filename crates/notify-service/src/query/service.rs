//! Notification query service.

use std::sync::Arc;

use tracing::info;

use notify_core::error::AppError;
use notify_core::result::AppResult;
use notify_core::types::{DeliveryId, NotificationId, PageRequest, PageResponse};
use notify_database::{DeliveryStore, NotificationStore};
use notify_entity::delivery::{Delivery, DeliveryStatistics};
use notify_entity::notification::{Notification, NotificationStatus, NotificationType};

/// Answers reads about notifications and their deliveries.
#[derive(Clone)]
pub struct NotificationQueryService {
    notifications: Arc<dyn NotificationStore>,
    deliveries: Arc<dyn DeliveryStore>,
}

impl NotificationQueryService {
    /// Creates a new query service.
    pub fn new(notifications: Arc<dyn NotificationStore>, deliveries: Arc<dyn DeliveryStore>) -> Self {
        Self {
            notifications,
            deliveries,
        }
    }

    /// Get a notification by ID.
    pub async fn get(&self, id: NotificationId) -> AppResult<Notification> {
        self.notifications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// List notifications, newest first.
    pub async fn list(&self, page: PageRequest) -> AppResult<PageResponse<Notification>> {
        self.notifications.list(&page).await
    }

    pub async fn by_type(&self, notification_type: NotificationType) -> AppResult<Vec<Notification>> {
        self.notifications.find_by_type(notification_type).await
    }

    pub async fn by_status(&self, status: NotificationStatus) -> AppResult<Vec<Notification>> {
        self.notifications.find_by_status(status).await
    }

    /// Every delivery of a notification.
    pub async fn deliveries(&self, id: NotificationId) -> AppResult<Vec<Delivery>> {
        self.get(id).await?;
        self.deliveries.find_by_notification(id).await
    }

    /// Delivery counts and success rate for a notification.
    pub async fn statistics(&self, id: NotificationId) -> AppResult<DeliveryStatistics> {
        self.get(id).await?;
        let counts = self.deliveries.count_by_status(id).await?;
        Ok(DeliveryStatistics::from_counts(counts))
    }

    /// Mark a recipient's delivered copies of a notification as read.
    /// Returns how many rows changed; repeated calls return 0.
    pub async fn mark_read(&self, id: NotificationId, recipient_id: i64) -> AppResult<u64> {
        self.get(id).await?;
        let updated = self.deliveries.mark_read(id, recipient_id).await?;
        if updated > 0 {
            info!(notification_id = %id, recipient_id, updated, "Marked as read");
        }
        Ok(updated)
    }

    /// Delivered but unread deliveries for a recipient.
    pub async fn unread(&self, recipient_id: i64) -> AppResult<Vec<Delivery>> {
        self.deliveries.find_unread(recipient_id).await
    }

    /// Deliveries that exhausted their retries, most recent first.
    pub async fn dead_letters(&self, limit: i64) -> AppResult<Vec<Delivery>> {
        self.deliveries.find_dead_lettered(limit.max(1)).await
    }

    /// Give a dead-lettered delivery a fresh retry budget.
    pub async fn requeue(&self, id: DeliveryId) -> AppResult<Delivery> {
        let delivery = self
            .deliveries
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Delivery {id} not found")))?;

        let requeued = self.deliveries.requeue(id).await?.ok_or_else(|| {
            AppError::conflict(format!(
                "Delivery {id} is {} and cannot be requeued",
                delivery.status
            ))
        })?;
        info!(delivery_id = %id, notification_id = %requeued.notification_id, "Dead letter requeued");
        Ok(requeued)
    }

    /// Requeue up to `limit` dead letters. Returns how many were requeued.
    pub async fn requeue_all(&self, limit: i64) -> AppResult<usize> {
        let mut requeued = 0;
        for delivery in self.dead_letters(limit).await? {
            if self.deliveries.requeue(delivery.id).await?.is_some() {
                requeued += 1;
            }
        }
        info!(requeued, "Dead letters requeued");
        Ok(requeued)
    }
}

impl std::fmt::Debug for NotificationQueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationQueryService").finish_non_exhaustive()
    }
}
