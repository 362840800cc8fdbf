//! Notification domain entities.

pub mod enums;
pub mod model;

pub use enums::{NotificationStatus, NotificationType, Priority, TargetAudience};
pub use model::{CreateNotification, Notification};
