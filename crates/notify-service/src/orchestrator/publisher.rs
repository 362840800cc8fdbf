//! Hand-off from the request path to the dispatch workers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use notify_core::result::AppResult;
use notify_core::types::NotificationId;

/// A unit of dispatch work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DispatchTask {
    pub notification_id: NotificationId,
}

impl DispatchTask {
    pub fn new(notification_id: NotificationId) -> Self {
        Self { notification_id }
    }
}

/// Publishes dispatch tasks to whatever runs them.
#[async_trait]
pub trait DispatchPublisher: Send + Sync + 'static {
    /// Queue a task. Returns `false` when an identical task is already
    /// queued or running.
    async fn publish(&self, task: DispatchTask) -> AppResult<bool>;
}
