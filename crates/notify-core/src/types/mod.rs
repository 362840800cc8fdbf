//! Core type definitions used across the School Notify workspace.

pub mod id;
pub mod pagination;

pub use id::{DeliveryId, NotificationId};
pub use pagination::{PageRequest, PageResponse};
