//! Notification classification enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use notify_core::AppError;

use crate::parse_variant;

/// Business category of a notification. Drives SMS template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Holiday,
    Circular,
    Announcement,
    FeeReminder,
    ExamSchedule,
    SportsEvent,
    CulturalEvent,
    Emergency,
    General,
}

impl NotificationType {
    /// Every notification type, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Holiday,
        Self::Circular,
        Self::Announcement,
        Self::FeeReminder,
        Self::ExamSchedule,
        Self::SportsEvent,
        Self::CulturalEvent,
        Self::Emergency,
        Self::General,
    ];

    /// Return the type as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Holiday => "HOLIDAY",
            Self::Circular => "CIRCULAR",
            Self::Announcement => "ANNOUNCEMENT",
            Self::FeeReminder => "FEE_REMINDER",
            Self::ExamSchedule => "EXAM_SCHEDULE",
            Self::SportsEvent => "SPORTS_EVENT",
            Self::CulturalEvent => "CULTURAL_EVENT",
            Self::Emergency => "EMERGENCY",
            Self::General => "GENERAL",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Holiday => "Holiday",
            Self::Circular => "Circular",
            Self::Announcement => "Announcement",
            Self::FeeReminder => "Fee Reminder",
            Self::ExamSchedule => "Exam Schedule",
            Self::SportsEvent => "Sports Event",
            Self::CulturalEvent => "Cultural Event",
            Self::Emergency => "Emergency",
            Self::General => "General",
        }
    }

    /// Name of the SMS template used for this type, if it has one.
    pub fn sms_template(&self) -> Option<&'static str> {
        match self {
            Self::Holiday => Some("holiday"),
            Self::Circular => Some("circular"),
            Self::Emergency => Some("emergency"),
            Self::FeeReminder => Some("fee_reminder"),
            Self::ExamSchedule => Some("exam_schedule"),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "notification type")
    }
}

/// Urgency of a notification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "notification_priority", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Normal, Self::High, Self::Urgent];

    /// Return the priority as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "priority")
    }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "target_audience", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetAudience {
    /// Parents of every active student.
    AllParents,
    /// Every active student.
    AllStudents,
    /// Parents of one class, optionally narrowed to a section.
    SpecificClass,
    /// Parents of an explicit list of students.
    SpecificStudent,
    /// School staff.
    AllStaff,
    /// Administrators.
    AdminOnly,
}

impl TargetAudience {
    /// Every audience, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::AllParents,
        Self::AllStudents,
        Self::SpecificClass,
        Self::SpecificStudent,
        Self::AllStaff,
        Self::AdminOnly,
    ];

    /// Return the audience as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllParents => "ALL_PARENTS",
            Self::AllStudents => "ALL_STUDENTS",
            Self::SpecificClass => "SPECIFIC_CLASS",
            Self::SpecificStudent => "SPECIFIC_STUDENT",
            Self::AllStaff => "ALL_STAFF",
            Self::AdminOnly => "ADMIN_ONLY",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AllParents => "All Parents",
            Self::AllStudents => "All Students",
            Self::SpecificClass => "Specific Class",
            Self::SpecificStudent => "Specific Student",
            Self::AllStaff => "All Staff",
            Self::AdminOnly => "Admin Only",
        }
    }
}

impl fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetAudience {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "target audience")
    }
}

/// Lifecycle status of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// Saved but not submitted.
    Draft,
    /// Waiting for dispatch, either immediately or at `scheduled_at`.
    Scheduled,
    /// Every delivery has been attempted.
    Sent,
    /// Dispatch could not run; see `failure_reason`.
    Failed,
    /// Withdrawn before dispatch.
    Cancelled,
}

impl NotificationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Scheduled,
        Self::Sent,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Whether the notification has not been dispatched yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Draft | Self::Scheduled)
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Return the status as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Scheduled => "SCHEDULED",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "notification status")
    }
}
