//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use notify_core::types::NotificationId;

use super::enums::{NotificationStatus, NotificationType, Priority, TargetAudience};
use crate::delivery::DeliveryMethod;

/// A message addressed to an audience, fanned out as deliveries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Business category.
    pub notification_type: NotificationType,
    /// Urgency.
    pub priority: Priority,
    /// Audience descriptor.
    pub target_audience: TargetAudience,
    /// Class scope for `SPECIFIC_CLASS`.
    pub class_id: Option<i64>,
    /// Optional section within the class.
    pub section: Option<String>,
    /// Academic year the notification belongs to.
    pub academic_year_id: Option<i64>,
    /// Student scope for `SPECIFIC_STUDENT`.
    pub student_ids: Vec<i64>,
    /// Requested channels.
    pub delivery_methods: Vec<DeliveryMethod>,
    /// Earliest dispatch time (None = immediate).
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Date of the event being announced, such as the holiday itself.
    pub event_date: Option<DateTime<Utc>>,
    /// When every delivery had been attempted.
    pub sent_at: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: NotificationStatus,
    /// Why dispatch failed, when status is `FAILED`.
    pub failure_reason: Option<String>,
    /// Creator reference.
    pub created_by: Option<String>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Build a new `SCHEDULED` notification from creation data.
    pub fn scheduled(data: CreateNotification) -> Self {
        let now = Utc::now();
        Self {
            id: NotificationId::new(),
            title: data.title,
            message: data.message,
            notification_type: data.notification_type,
            priority: data.priority,
            target_audience: data.target_audience,
            class_id: data.class_id,
            section: data.section,
            academic_year_id: data.academic_year_id,
            student_ids: data.student_ids,
            delivery_methods: data.delivery_methods,
            scheduled_at: data.scheduled_at,
            event_date: data.event_date,
            sent_at: None,
            status: NotificationStatus::Scheduled,
            failure_reason: None,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the notification should be dispatched at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Scheduled
            && self.scheduled_at.is_none_or(|at| at <= now)
    }
}

/// Data required to create a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub target_audience: TargetAudience,
    pub class_id: Option<i64>,
    pub section: Option<String>,
    pub academic_year_id: Option<i64>,
    pub student_ids: Vec<i64>,
    pub delivery_methods: Vec<DeliveryMethod>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub event_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

impl CreateNotification {
    /// Creation data with defaults for everything but the content and audience.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
        target_audience: TargetAudience,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            notification_type,
            priority: Priority::Normal,
            target_audience,
            class_id: None,
            section: None,
            academic_year_id: None,
            student_ids: Vec::new(),
            delivery_methods: vec![DeliveryMethod::InApp],
            scheduled_at: None,
            event_date: None,
            created_by: None,
        }
    }
}
