//! In-memory notification store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use notify_core::error::AppError;
use notify_core::result::AppResult;
use notify_core::types::{NotificationId, PageRequest, PageResponse};
use notify_entity::notification::{Notification, NotificationStatus, NotificationType};

use crate::store::NotificationStore;

/// Notification store held in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    rows: Arc<DashMap<NotificationId, Notification>>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notifications.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn newest_first(&self, keep: impl Fn(&Notification) -> bool) -> Vec<Notification> {
        let mut items: Vec<Notification> = self
            .rows
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        items
    }

    /// Apply `f` if the row is still `SCHEDULED`.
    fn settle(&self, id: NotificationId, f: impl FnOnce(&mut Notification)) -> AppResult<bool> {
        let mut row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;
        if row.status != NotificationStatus::Scheduled {
            return Ok(false);
        }
        f(row.value_mut());
        row.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        if self.rows.contains_key(&notification.id) {
            return Err(AppError::conflict(format!(
                "Notification {} already exists",
                notification.id
            )));
        }
        self.rows.insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn find_by_id(&self, id: NotificationId) -> AppResult<Option<Notification>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<Notification>> {
        let all = self.newest_first(|_| true);
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, *page, total))
    }

    async fn find_by_type(&self, notification_type: NotificationType) -> AppResult<Vec<Notification>> {
        Ok(self.newest_first(|n| n.notification_type == notification_type))
    }

    async fn find_by_status(&self, status: NotificationStatus) -> AppResult<Vec<Notification>> {
        Ok(self.newest_first(|n| n.status == status))
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>> {
        let mut due = self.newest_first(|n| {
            n.status == NotificationStatus::Scheduled
                && match n.scheduled_at {
                    Some(at) => at <= now,
                    None => n.created_at <= stale_before,
                }
        });
        due.sort_by_key(|n| n.scheduled_at.unwrap_or(n.created_at));
        Ok(due)
    }

    async fn mark_sent(&self, id: NotificationId) -> AppResult<bool> {
        self.settle(id, |n| {
            n.status = NotificationStatus::Sent;
            n.sent_at = Some(Utc::now());
        })
    }

    async fn mark_failed(&self, id: NotificationId, reason: &str) -> AppResult<bool> {
        self.settle(id, |n| {
            n.status = NotificationStatus::Failed;
            n.failure_reason = Some(reason.to_string());
        })
    }

    async fn cancel(&self, id: NotificationId) -> AppResult<bool> {
        let Some(mut row) = self.rows.get_mut(&id) else {
            return Ok(false);
        };
        if !row.status.is_pending() {
            return Ok(false);
        }
        row.status = NotificationStatus::Cancelled;
        row.updated_at = Utc::now();
        Ok(true)
    }
}
