//! Dispatch orchestration.

pub mod publisher;
pub mod request;
pub mod service;

pub use publisher::{DispatchPublisher, DispatchTask};
pub use request::DispatchRequest;
pub use service::{DispatchOutcome, DispatchSummary, NotificationOrchestrator};
