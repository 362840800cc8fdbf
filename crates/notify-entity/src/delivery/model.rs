//! Delivery entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use notify_core::types::{DeliveryId, NotificationId};

use super::status::{DeliveryMethod, DeliveryStatus};
use crate::recipient::RecipientType;

/// One transmission of a notification to one recipient over one channel.
///
/// Unique on `(notification_id, recipient_id, delivery_method)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Delivery {
    /// Unique delivery identifier.
    pub id: DeliveryId,
    /// Owning notification.
    pub notification_id: NotificationId,
    /// Directory id of the recipient.
    pub recipient_id: i64,
    /// Kind of recipient.
    pub recipient_type: RecipientType,
    /// Channel used.
    pub delivery_method: DeliveryMethod,
    /// Normalized phone number, email address, or inbox id.
    pub destination: Option<String>,
    /// Current status.
    pub status: DeliveryStatus,
    /// When the provider accepted the message.
    pub sent_at: Option<DateTime<Utc>>,
    /// When delivery was confirmed.
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the recipient read the message.
    pub read_at: Option<DateTime<Utc>>,
    /// When the retry budget ran out.
    pub dead_lettered_at: Option<DateTime<Utc>>,
    /// Last provider error.
    pub error_message: Option<String>,
    /// Number of retries consumed by the sweeper.
    pub retry_count: i32,
    /// When the delivery was created.
    pub created_at: DateTime<Utc>,
    /// When the delivery was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    /// Build a `PENDING` delivery from creation data.
    pub fn pending(data: CreateDelivery) -> Self {
        let now = Utc::now();
        Self {
            id: DeliveryId::new(),
            notification_id: data.notification_id,
            recipient_id: data.recipient_id,
            recipient_type: data.recipient_type,
            delivery_method: data.delivery_method,
            destination: data.destination,
            status: DeliveryStatus::Pending,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            dead_lettered_at: None,
            error_message: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the sweeper may retry this delivery under `max_retries`.
    pub fn is_retryable(&self, max_retries: i32) -> bool {
        self.status == DeliveryStatus::Failed && self.retry_count < max_retries
    }

    /// Whether this is an in-app delivery that has not been read yet.
    pub fn is_unread(&self) -> bool {
        self.status == DeliveryStatus::Delivered && self.read_at.is_none()
    }
}

/// Data required to upsert a delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDelivery {
    pub notification_id: NotificationId,
    pub recipient_id: i64,
    pub recipient_type: RecipientType,
    pub delivery_method: DeliveryMethod,
    pub destination: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(retry_count: i32) -> Delivery {
        let mut d = Delivery::pending(CreateDelivery {
            notification_id: NotificationId::new(),
            recipient_id: 42,
            recipient_type: RecipientType::Parent,
            delivery_method: DeliveryMethod::Sms,
            destination: Some("+919876543210".into()),
        });
        d.status = DeliveryStatus::Failed;
        d.retry_count = retry_count;
        d
    }

    #[test]
    fn test_retryable_below_ceiling() {
        assert!(failed(0).is_retryable(3));
        assert!(failed(2).is_retryable(3));
        assert!(!failed(3).is_retryable(3));
    }

    #[test]
    fn test_only_failed_is_retryable() {
        let mut d = failed(0);
        d.status = DeliveryStatus::DeadLettered;
        assert!(!d.is_retryable(3));
    }
}
