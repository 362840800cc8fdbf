//! Storage traits for notifications and deliveries.
//!
//! The service and worker layers hold these as `Arc<dyn ...>` so the same
//! orchestration code runs against PostgreSQL in production and against
//! the in-memory stores in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use notify_core::result::AppResult;
use notify_core::types::{DeliveryId, NotificationId, PageRequest, PageResponse};
use notify_entity::delivery::{CreateDelivery, Delivery, DeliveryStatus};
use notify_entity::notification::{Notification, NotificationStatus, NotificationType};

/// Persistence for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Insert a new notification and return the stored row.
    async fn insert(&self, notification: &Notification) -> AppResult<Notification>;

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>>;

    /// Newest first.
    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Notification>>;

    async fn find_by_type(&self, notification_type: NotificationType) -> AppResult<Vec<Notification>>;

    async fn find_by_status(&self, status: NotificationStatus) -> AppResult<Vec<Notification>>;

    /// `SCHEDULED` notifications ready for dispatch: those whose
    /// `scheduled_at` is at or before `now`, plus unscheduled ones created
    /// at or before `stale_before`.
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>>;

    /// Move a `SCHEDULED` notification to `SENT` and stamp `sent_at`.
    /// Returns `false` when it was no longer `SCHEDULED`.
    async fn mark_sent(&self, id: NotificationId) -> AppResult<bool>;

    /// Move a `SCHEDULED` notification to `FAILED` with the given reason.
    /// Returns `false` when it was no longer `SCHEDULED`.
    async fn mark_failed(&self, id: NotificationId, reason: &str) -> AppResult<bool>;

    /// Move a `DRAFT` or `SCHEDULED` notification to `CANCELLED`.
    /// Returns `false` when the notification was not pending.
    async fn cancel(&self, id: NotificationId) -> AppResult<bool>;
}

/// Persistence for deliveries.
#[async_trait]
pub trait DeliveryStore: Send + Sync + 'static {
    /// Insert a `PENDING` delivery, or return the existing row with the same
    /// `(notification_id, recipient_id, delivery_method)`.
    async fn upsert_pending(&self, data: &CreateDelivery) -> AppResult<Delivery>;

    async fn find_by_id(&self, id: DeliveryId) -> AppResult<Option<Delivery>>;

    async fn find_by_notification(&self, notification_id: NotificationId)
    -> AppResult<Vec<Delivery>>;

    // The three outcome writes below only touch `PENDING` or `FAILED` rows
    // and return `false` otherwise, so a cancelled row stays cancelled.

    /// Provider accepted the message.
    async fn mark_sent(&self, id: DeliveryId) -> AppResult<bool>;

    /// Delivery confirmed (in-app, or a successful retry).
    async fn mark_delivered(&self, id: DeliveryId) -> AppResult<bool>;

    /// First-attempt failure. Does not consume a retry.
    async fn mark_failed(&self, id: DeliveryId, error: &str) -> AppResult<bool>;

    /// Failed retry: increments `retry_count` and dead-letters the row once
    /// the count reaches `max_retries`. Returns the updated row.
    async fn record_retry_failure(
        &self,
        id: DeliveryId,
        error: &str,
        max_retries: i32,
    ) -> AppResult<Delivery>;

    /// `FAILED` rows with `retry_count < max_retries`, least recently updated first.
    async fn find_retryable(&self, max_retries: i32, limit: i64) -> AppResult<Vec<Delivery>>;

    /// Flip the pair's `DELIVERED` rows to `READ`. Returns the number changed.
    async fn mark_read(&self, notification_id: NotificationId, recipient_id: i64)
    -> AppResult<u64>;

    /// `DELIVERED` rows for the recipient with no `read_at`.
    async fn find_unread(&self, recipient_id: i64) -> AppResult<Vec<Delivery>>;

    /// Row counts per status for one notification.
    async fn count_by_status(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Vec<(DeliveryStatus, i64)>>;

    /// Cancel every still-`PENDING` delivery of a notification.
    async fn cancel_pending(&self, notification_id: NotificationId) -> AppResult<u64>;

    /// Dead-lettered rows, most recent first.
    async fn find_dead_lettered(&self, limit: i64) -> AppResult<Vec<Delivery>>;

    /// Move a `DEAD_LETTERED` row back to `FAILED` with a fresh retry budget.
    /// Returns `None` when the row is missing or not dead-lettered.
    async fn requeue(&self, id: DeliveryId) -> AppResult<Option<Delivery>>;
}
