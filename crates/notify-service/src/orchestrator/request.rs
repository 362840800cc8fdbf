//! Dispatch request and its validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notify_channel::ChannelRegistry;
use notify_core::error::AppError;
use notify_core::result::AppResult;
use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::{CreateNotification, NotificationType, Priority, TargetAudience};

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 255;
/// Maximum message length in characters.
pub const MAX_MESSAGE_LEN: usize = 4000;
/// Maximum section label length in characters.
pub const MAX_SECTION_LEN: usize = 10;

/// A request to notify an audience.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub academic_year_id: Option<i64>,
    #[serde(default)]
    pub student_ids: Vec<i64>,
    /// Empty means in-app only.
    #[serde(default)]
    pub delivery_methods: Vec<DeliveryMethod>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Date of the announced event. Does not delay dispatch.
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl DispatchRequest {
    /// A request with defaults for everything but content and audience.
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
            delivery_methods: Vec::new(),
            scheduled_at: None,
            event_date: None,
            created_by: None,
        }
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = DeliveryMethod>) -> Self {
        self.delivery_methods = methods.into_iter().collect();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn for_event(mut self, date: DateTime<Utc>) -> Self {
        self.event_date = Some(date);
        self
    }

    /// Check the request against the registered channels and turn it into
    /// creation data. Methods are de-duplicated in request order.
    pub fn validate(self, channels: &ChannelRegistry) -> AppResult<CreateNotification> {
        let title = self.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::validation(format!(
                "Title must be between 1 and {MAX_TITLE_LEN} characters"
            )));
        }
        let message = self.message.trim();
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::validation(format!(
                "Message must be between 1 and {MAX_MESSAGE_LEN} characters"
            )));
        }

        let section = self
            .section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if section.as_ref().is_some_and(|s| s.chars().count() > MAX_SECTION_LEN) {
            return Err(AppError::validation(format!(
                "Section must be at most {MAX_SECTION_LEN} characters"
            )));
        }
        match self.target_audience {
            TargetAudience::SpecificClass if self.class_id.is_none() => {
                return Err(AppError::validation("SPECIFIC_CLASS requires class_id"));
            }
            TargetAudience::SpecificStudent if self.student_ids.is_empty() => {
                return Err(AppError::validation("SPECIFIC_STUDENT requires student_ids"));
            }
            _ => {}
        }
        if section.is_some() && self.class_id.is_none() {
            return Err(AppError::validation("section requires class_id"));
        }

        let mut methods: Vec<DeliveryMethod> = Vec::with_capacity(self.delivery_methods.len());
        for method in self.delivery_methods {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        if methods.is_empty() {
            methods.push(DeliveryMethod::InApp);
        }
        if let Some(missing) = methods.iter().find(|m| !channels.supports(**m)) {
            return Err(AppError::validation(format!(
                "Delivery method {missing} is not available"
            )));
        }

        Ok(CreateNotification {
            title: title.to_string(),
            message: message.to_string(),
            notification_type: self.notification_type,
            priority: self.priority,
            target_audience: self.target_audience,
            class_id: self.class_id,
            section,
            academic_year_id: self.academic_year_id,
            student_ids: self.student_ids,
            delivery_methods: methods,
            scheduled_at: self.scheduled_at,
            event_date: self.event_date,
            created_by: self.created_by,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_channel::InAppChannel;
    use notify_core::error::ErrorKind;
    use std::sync::Arc;

    fn registry() -> ChannelRegistry {
        ChannelRegistry::new().with(Arc::new(InAppChannel))
    }

    fn request() -> DispatchRequest {
        DispatchRequest::new("PTA", "Saturday", NotificationType::Circular, TargetAudience::AllParents)
    }

    #[test]
    fn test_defaults_to_in_app() {
        let data = request().validate(&registry()).unwrap();
        assert_eq!(data.delivery_methods, vec![DeliveryMethod::InApp]);
        assert_eq!(data.priority, Priority::Normal);
    }

    #[test]
    fn test_rejects_blank_and_oversized_text() {
        let mut r = request();
        r.title = "   ".into();
        assert_eq!(r.validate(&registry()).unwrap_err().kind, ErrorKind::Validation);

        let mut r = request();
        r.message = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert_eq!(r.validate(&registry()).unwrap_err().kind, ErrorKind::Validation);
    }

    #[test]
    fn test_audience_scope_rules() {
        let mut r = request();
        r.target_audience = TargetAudience::SpecificClass;
        assert!(r.clone().validate(&registry()).is_err());
        r.class_id = Some(7);
        r.section = Some(" B ".into());
        assert_eq!(r.validate(&registry()).unwrap().section.as_deref(), Some("B"));

        let mut r = request();
        r.target_audience = TargetAudience::SpecificStudent;
        assert!(r.validate(&registry()).is_err());

        let mut r = request();
        r.section = Some("A".into());
        assert!(r.validate(&registry()).is_err());
    }

    #[test]
    fn test_section_length_limited() {
        let mut r = request();
        r.target_audience = TargetAudience::SpecificClass;
        r.class_id = Some(7);
        r.section = Some("S".repeat(MAX_SECTION_LEN + 1));
        assert_eq!(r.clone().validate(&registry()).unwrap_err().kind, ErrorKind::Validation);

        r.section = Some(format!("  {}  ", "S".repeat(MAX_SECTION_LEN)));
        assert_eq!(
            r.validate(&registry()).unwrap().section.map(|s| s.len()),
            Some(MAX_SECTION_LEN)
        );
    }

    #[test]
    fn test_unregistered_method_rejected() {
        let r = request().with_methods([DeliveryMethod::InApp, DeliveryMethod::Push]);
        let err = r.validate(&registry()).unwrap_err();
        assert!(err.message.contains("PUSH"));
    }

    #[test]
    fn test_methods_deduplicated() {
        let r = request().with_methods([DeliveryMethod::InApp, DeliveryMethod::InApp]);
        assert_eq!(
            r.validate(&registry()).unwrap().delivery_methods,
            vec![DeliveryMethod::InApp]
        );
    }
}
