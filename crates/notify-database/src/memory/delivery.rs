//! In-memory delivery store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use notify_core::error::AppError;
use notify_core::result::AppResult;
use notify_core::types::{DeliveryId, NotificationId};
use notify_entity::delivery::{CreateDelivery, Delivery, DeliveryMethod, DeliveryStatus};

use crate::store::DeliveryStore;

type UniqueKey = (NotificationId, i64, DeliveryMethod);

/// Delivery store held in concurrent maps.
///
/// A secondary index on `(notification_id, recipient_id, delivery_method)`
/// enforces the same uniqueness the database constraint does.
#[derive(Debug, Clone, Default)]
pub struct MemoryDeliveryStore {
    rows: Arc<DashMap<DeliveryId, Delivery>>,
    unique: Arc<DashMap<UniqueKey, DeliveryId>>,
}

impl MemoryDeliveryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored deliveries.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert or replace a row as-is. Lets tests seed arbitrary states.
    pub fn put(&self, delivery: Delivery) {
        self.unique.insert(
            (
                delivery.notification_id,
                delivery.recipient_id,
                delivery.delivery_method,
            ),
            delivery.id,
        );
        self.rows.insert(delivery.id, delivery);
    }

    fn select(&self, keep: impl Fn(&Delivery) -> bool) -> Vec<Delivery> {
        self.rows
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Apply `f` if the row is `PENDING` or `FAILED`.
    fn settle(&self, id: DeliveryId, f: impl FnOnce(&mut Delivery)) -> AppResult<bool> {
        let mut row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Delivery {id} not found")))?;
        if !matches!(row.status, DeliveryStatus::Pending | DeliveryStatus::Failed) {
            return Ok(false);
        }
        f(row.value_mut());
        row.updated_at = Utc::now();
        Ok(true)
    }

    fn update(&self, id: DeliveryId, f: impl FnOnce(&mut Delivery)) -> AppResult<Delivery> {
        let mut row = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Delivery {id} not found")))?;
        f(row.value_mut());
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

#[async_trait]
impl DeliveryStore for MemoryDeliveryStore {
    async fn upsert_pending(&self, data: &CreateDelivery) -> AppResult<Delivery> {
        let key = (data.notification_id, data.recipient_id, data.delivery_method);
        match self.unique.entry(key) {
            Entry::Occupied(existing) => {
                let id = *existing.get();
                drop(existing);
                self.rows
                    .get(&id)
                    .map(|r| r.value().clone())
                    .ok_or_else(|| AppError::internal(format!("Delivery index points at missing row {id}")))
            }
            Entry::Vacant(slot) => {
                let delivery = Delivery::pending(data.clone());
                slot.insert(delivery.id);
                self.rows.insert(delivery.id, delivery.clone());
                Ok(delivery)
            }
        }
    }

    async fn find_by_id(&self, id: DeliveryId) -> AppResult<Option<Delivery>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Vec<Delivery>> {
        let mut rows = self.select(|d| d.notification_id == notification_id);
        rows.sort_by_key(|d| (d.delivery_method.as_str(), d.recipient_id));
        Ok(rows)
    }

    async fn mark_sent(&self, id: DeliveryId) -> AppResult<bool> {
        self.settle(id, |d| {
            d.status = DeliveryStatus::Sent;
            d.sent_at = Some(Utc::now());
            d.error_message = None;
        })
    }

    async fn mark_delivered(&self, id: DeliveryId) -> AppResult<bool> {
        self.settle(id, |d| {
            let now = Utc::now();
            d.status = DeliveryStatus::Delivered;
            d.sent_at.get_or_insert(now);
            d.delivered_at = Some(now);
            d.error_message = None;
        })
    }

    async fn mark_failed(&self, id: DeliveryId, error: &str) -> AppResult<bool> {
        self.settle(id, |d| {
            d.status = DeliveryStatus::Failed;
            d.error_message = Some(error.to_string());
        })
    }

    async fn record_retry_failure(
        &self,
        id: DeliveryId,
        error: &str,
        max_retries: i32,
    ) -> AppResult<Delivery> {
        self.update(id, |d| {
            d.retry_count = (d.retry_count + 1).min(max_retries);
            d.error_message = Some(error.to_string());
            if d.retry_count >= max_retries {
                d.status = DeliveryStatus::DeadLettered;
                d.dead_lettered_at = Some(Utc::now());
            } else {
                d.status = DeliveryStatus::Failed;
            }
        })
    }

    async fn find_retryable(&self, max_retries: i32, limit: i64) -> AppResult<Vec<Delivery>> {
        let mut rows = self.select(|d| d.is_retryable(max_retries));
        rows.sort_by_key(|d| d.updated_at);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn mark_read(&self, notification_id: NotificationId, recipient_id: i64) -> AppResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for mut row in self.rows.iter_mut() {
            let d = row.value_mut();
            if d.notification_id == notification_id
                && d.recipient_id == recipient_id
                && d.status == DeliveryStatus::Delivered
            {
                d.status = DeliveryStatus::Read;
                d.read_at = Some(now);
                d.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn find_unread(&self, recipient_id: i64) -> AppResult<Vec<Delivery>> {
        let mut rows = self.select(|d| d.recipient_id == recipient_id && d.is_unread());
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count_by_status(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Vec<(DeliveryStatus, i64)>> {
        let mut counts: Vec<(DeliveryStatus, i64)> = Vec::new();
        for d in self.select(|d| d.notification_id == notification_id) {
            match counts.iter_mut().find(|(s, _)| *s == d.status) {
                Some((_, n)) => *n += 1,
                None => counts.push((d.status, 1)),
            }
        }
        Ok(counts)
    }

    async fn cancel_pending(&self, notification_id: NotificationId) -> AppResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for mut row in self.rows.iter_mut() {
            let d = row.value_mut();
            if d.notification_id == notification_id && d.status == DeliveryStatus::Pending {
                d.status = DeliveryStatus::Cancelled;
                d.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn find_dead_lettered(&self, limit: i64) -> AppResult<Vec<Delivery>> {
        let mut rows = self.select(|d| d.status == DeliveryStatus::DeadLettered);
        rows.sort_by(|a, b| b.dead_lettered_at.cmp(&a.dead_lettered_at));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn requeue(&self, id: DeliveryId) -> AppResult<Option<Delivery>> {
        let Some(mut row) = self.rows.get_mut(&id) else {
            return Ok(None);
        };
        if row.status != DeliveryStatus::DeadLettered {
            return Ok(None);
        }
        row.status = DeliveryStatus::Failed;
        row.retry_count = 0;
        row.dead_lettered_at = None;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
}
