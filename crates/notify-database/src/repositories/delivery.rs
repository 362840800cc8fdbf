//! Delivery repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use notify_core::error::{AppError, ErrorKind};
use notify_core::result::AppResult;
use notify_core::types::{DeliveryId, NotificationId};
use notify_entity::delivery::{CreateDelivery, Delivery, DeliveryStatus};

use crate::store::DeliveryStore;

/// PostgreSQL-backed [`DeliveryStore`].
#[derive(Debug, Clone)]
pub struct PgDeliveryRepository {
    pool: PgPool,
}

impl PgDeliveryRepository {
    /// Create a new delivery repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_status(&self, id: DeliveryId, sql: &str, what: &str) -> AppResult<bool> {
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e))?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl DeliveryStore for PgDeliveryRepository {
    async fn upsert_pending(&self, data: &CreateDelivery) -> AppResult<Delivery> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        sqlx::query_as::<_, Delivery>(
            "INSERT INTO notification_deliveries \
             (id, notification_id, recipient_id, recipient_type, delivery_method, destination) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (notification_id, recipient_id, delivery_method) DO UPDATE \
             SET destination = COALESCE(notification_deliveries.destination, EXCLUDED.destination) \
             RETURNING *",
        )
        .bind(DeliveryId::new())
        .bind(data.notification_id)
        .bind(data.recipient_id)
        .bind(data.recipient_type)
        .bind(data.delivery_method)
        .bind(&data.destination)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert delivery", e))
    }

    async fn find_by_id(&self, id: DeliveryId) -> AppResult<Option<Delivery>> {
        sqlx::query_as::<_, Delivery>("SELECT * FROM notification_deliveries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find delivery", e))
    }

    async fn find_by_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Vec<Delivery>> {
        sqlx::query_as::<_, Delivery>(
            "SELECT * FROM notification_deliveries WHERE notification_id = $1 \
             ORDER BY delivery_method, recipient_id",
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list deliveries", e))
    }

    async fn mark_sent(&self, id: DeliveryId) -> AppResult<bool> {
        self.set_status(
            id,
            "UPDATE notification_deliveries SET status = 'sent', sent_at = NOW(), \
             error_message = NULL, updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'failed')",
            "mark delivery sent",
        )
        .await
    }

    async fn mark_delivered(&self, id: DeliveryId) -> AppResult<bool> {
        self.set_status(
            id,
            "UPDATE notification_deliveries SET status = 'delivered', \
             sent_at = COALESCE(sent_at, NOW()), delivered_at = NOW(), \
             error_message = NULL, updated_at = NOW() \
             WHERE id = $1 AND status IN ('pending', 'failed')",
            "mark delivery delivered",
        )
        .await
    }

    async fn mark_failed(&self, id: DeliveryId, error: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notification_deliveries SET status = 'failed', error_message = $2, \
             updated_at = NOW() WHERE id = $1 AND status IN ('pending', 'failed')",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark delivery failed", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn record_retry_failure(
        &self,
        id: DeliveryId,
        error: &str,
        max_retries: i32,
    ) -> AppResult<Delivery> {
        sqlx::query_as::<_, Delivery>(
            "UPDATE notification_deliveries SET \
               retry_count = LEAST(retry_count + 1, $3), \
               error_message = $2, \
               status = CASE WHEN retry_count + 1 >= $3 \
                        THEN 'dead_lettered'::delivery_status ELSE 'failed'::delivery_status END, \
               dead_lettered_at = CASE WHEN retry_count + 1 >= $3 THEN NOW() ELSE NULL END, \
               updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(error)
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record retry failure", e))
    }

    async fn find_retryable(&self, max_retries: i32, limit: i64) -> AppResult<Vec<Delivery>> {
        sqlx::query_as::<_, Delivery>(
            "SELECT * FROM notification_deliveries \
             WHERE status = 'failed' AND retry_count < $1 \
             ORDER BY updated_at LIMIT $2",
        )
        .bind(max_retries)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find retryable deliveries", e)
        })
    }

    async fn mark_read(&self, notification_id: NotificationId, recipient_id: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notification_deliveries SET status = 'read', read_at = NOW(), updated_at = NOW() \
             WHERE notification_id = $1 AND recipient_id = $2 AND status = 'delivered'",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark deliveries read", e))?;
        Ok(result.rows_affected())
    }

    async fn find_unread(&self, recipient_id: i64) -> AppResult<Vec<Delivery>> {
        sqlx::query_as::<_, Delivery>(
            "SELECT * FROM notification_deliveries \
             WHERE recipient_id = $1 AND status = 'delivered' AND read_at IS NULL \
             ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find unread deliveries", e))
    }

    async fn count_by_status(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Vec<(DeliveryStatus, i64)>> {
        sqlx::query_as::<_, (DeliveryStatus, i64)>(
            "SELECT status, COUNT(*) FROM notification_deliveries \
             WHERE notification_id = $1 GROUP BY status",
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count deliveries", e))
    }

    async fn cancel_pending(&self, notification_id: NotificationId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notification_deliveries SET status = 'cancelled', updated_at = NOW() \
             WHERE notification_id = $1 AND status = 'pending'",
        )
        .bind(notification_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel deliveries", e))?;
        Ok(result.rows_affected())
    }

    async fn find_dead_lettered(&self, limit: i64) -> AppResult<Vec<Delivery>> {
        sqlx::query_as::<_, Delivery>(
            "SELECT * FROM notification_deliveries WHERE status = 'dead_lettered' \
             ORDER BY dead_lettered_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list dead letters", e))
    }

    async fn requeue(&self, id: DeliveryId) -> AppResult<Option<Delivery>> {
        sqlx::query_as::<_, Delivery>(
            "UPDATE notification_deliveries SET status = 'failed', retry_count = 0, \
             dead_lettered_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status = 'dead_lettered' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to requeue delivery", e))
    }
}
