//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use notify_channel::whatsapp::{InteractiveMessage, ReplyButton};
use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::{NotificationType, Priority, TargetAudience};
use notify_service::DispatchRequest;

/// Full notification request, used by the generic send and schedule routes.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationRequest {
    #[validate(length(min = 1, max = 255, message = "Title is required and must be at most 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 4000, message = "Message is required and must be at most 4000 characters"))]
    pub message: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_audience")]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    #[validate(length(min = 1, max = 10))]
    pub section: Option<String>,
    #[serde(default)]
    pub academic_year_id: Option<i64>,
    #[serde(default)]
    pub student_ids: Vec<i64>,
    #[serde(default)]
    pub delivery_methods: Vec<DeliveryMethod>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
}

fn default_audience() -> TargetAudience {
    TargetAudience::AllParents
}

impl From<NotificationRequest> for DispatchRequest {
    fn from(req: NotificationRequest) -> Self {
        let mut dispatch = DispatchRequest::new(
            req.title,
            req.message,
            req.notification_type,
            req.target_audience,
        )
        .with_priority(req.priority)
        .with_methods(req.delivery_methods);
        dispatch.class_id = req.class_id;
        dispatch.section = req.section;
        dispatch.academic_year_id = req.academic_year_id;
        dispatch.student_ids = req.student_ids;
        dispatch.scheduled_at = req.scheduled_at;
        dispatch.event_date = req.event_date;
        dispatch.created_by = req.created_by;
        dispatch
    }
}

/// Holiday announcement.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HolidayRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    /// Recorded as the notification's event date; the notice goes out now.
    pub holiday_date: DateTime<Utc>,
    #[serde(default)]
    pub delivery_methods: Vec<DeliveryMethod>,
}

/// Circular or emergency announcement to all parents.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 4000))]
    pub message: String,
    #[serde(default)]
    pub delivery_methods: Vec<DeliveryMethod>,
}

/// Plain WhatsApp text to one number.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WhatsAppMessageRequest {
    #[validate(length(min = 1))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 4096))]
    pub message: String,
}

/// Approved WhatsApp template to one number.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WhatsAppTemplateRequest {
    #[validate(length(min = 1))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 512))]
    pub template_name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// WhatsApp media attachment to one number.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WhatsAppMediaRequest {
    #[validate(length(min = 1))]
    pub phone_number: String,
    /// `image`, `document`, `audio` or `video`.
    pub media_type: String,
    #[validate(url)]
    pub media_url: String,
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub caption: Option<String>,
}

/// Reply-button message to one number.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WhatsAppInteractiveRequest {
    #[validate(length(min = 1))]
    pub phone_number: String,
    #[serde(default)]
    pub header: Option<String>,
    #[validate(length(min = 1, max = 1024))]
    pub body: String,
    #[serde(default)]
    pub footer: Option<String>,
    #[validate(length(min = 1, max = 3, message = "Between 1 and 3 buttons are required"))]
    pub buttons: Vec<ReplyButton>,
}

impl From<WhatsAppInteractiveRequest> for InteractiveMessage {
    fn from(req: WhatsAppInteractiveRequest) -> Self {
        Self {
            header: req.header,
            body: req.body,
            footer: req.footer,
            buttons: req.buttons,
        }
    }
}

/// Same WhatsApp text to many numbers.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WhatsAppBulkRequest {
    #[validate(length(min = 1, max = 1000, message = "Between 1 and 1000 phone numbers are required"))]
    pub phone_numbers: Vec<String>,
    #[validate(length(min = 1, max = 4096))]
    pub message: String,
}

/// Query parameters for the dead-letter listing and bulk requeue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadLetterQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

impl DeadLetterQuery {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 1000;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_request_defaults() {
        let req: NotificationRequest = serde_json::from_value(serde_json::json!({
            "title": "Exams",
            "message": "Term exams start on Monday",
            "notification_type": "EXAM_SCHEDULE",
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let dispatch = DispatchRequest::from(req);
        assert_eq!(dispatch.target_audience, TargetAudience::AllParents);
        assert_eq!(dispatch.priority, Priority::Normal);
        assert!(dispatch.delivery_methods.is_empty());
    }

    #[test]
    fn test_empty_title_fails_validation() {
        let req = AnnouncementRequest {
            title: String::new(),
            message: "body".into(),
            delivery_methods: vec![],
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn test_media_url_must_be_url() {
        let req = WhatsAppMediaRequest {
            phone_number: "9876543210".into(),
            media_type: "image".into(),
            media_url: "not a url".into(),
            caption: None,
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("media_url"));
    }

    #[test]
    fn test_dead_letter_limit_is_clamped() {
        assert_eq!(DeadLetterQuery::default().limit(), 100);
        assert_eq!(DeadLetterQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(DeadLetterQuery { limit: Some(50_000) }.limit(), 1000);
    }
}
