//! Read-side operations and operator mutations on stored notifications.

pub mod service;

pub use service::NotificationQueryService;
