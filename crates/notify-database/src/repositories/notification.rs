//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use notify_core::error::{AppError, ErrorKind};
use notify_core::result::AppResult;
use notify_core::types::{NotificationId, PageRequest, PageResponse};
use notify_entity::notification::{Notification, NotificationStatus, NotificationType};

use crate::store::NotificationStore;

/// PostgreSQL-backed [`NotificationStore`].
#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationRepository {
    async fn insert(&self, n: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, title, message, notification_type, priority, \
             target_audience, class_id, section, academic_year_id, student_ids, delivery_methods, \
             scheduled_at, event_date, sent_at, status, failure_reason, created_by, created_at, \
             updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
             $19) \
             RETURNING *",
        )
        .bind(n.id)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.notification_type)
        .bind(n.priority)
        .bind(n.target_audience)
        .bind(n.class_id)
        .bind(&n.section)
        .bind(n.academic_year_id)
        .bind(&n.student_ids)
        .bind(&n.delivery_methods)
        .bind(n.scheduled_at)
        .bind(n.event_date)
        .bind(n.sent_at)
        .bind(n.status)
        .bind(&n.failure_reason)
        .bind(&n.created_by)
        .bind(n.created_at)
        .bind(n.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find notification", e))
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
            })?;

        let items = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok(PageResponse::new(items, *page, total as u64))
    }

    async fn find_by_type(&self, notification_type: NotificationType) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE notification_type = $1 ORDER BY created_at DESC",
        )
        .bind(notification_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list notifications by type", e)
        })
    }

    async fn find_by_status(&self, status: NotificationStatus) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list notifications by status", e)
        })
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE status = 'scheduled' \
             AND ((scheduled_at IS NOT NULL AND scheduled_at <= $1) \
               OR (scheduled_at IS NULL AND created_at <= $2)) \
             ORDER BY COALESCE(scheduled_at, created_at)",
        )
        .bind(now)
        .bind(stale_before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find due notifications", e))
    }

    async fn mark_sent(&self, id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'sent', sent_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark notification sent", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(&self, id: NotificationId, reason: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'failed', failure_reason = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark notification failed", e)
        })?;
        Ok(result.rows_affected() == 1)
    }

    async fn cancel(&self, id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status IN ('draft', 'scheduled')",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel notification", e))?;
        Ok(result.rows_affected() > 0)
    }
}
