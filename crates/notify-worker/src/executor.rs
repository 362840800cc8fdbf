//! Dispatch executor: runs one queued task through the orchestrator.

use std::sync::Arc;

use notify_core::error::{AppError, ErrorKind};
use notify_service::{DispatchSummary, DispatchTask, NotificationOrchestrator};

/// Error from task execution.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, not retried
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; the promoter picks the notification up again
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Classify an error returned by the orchestrator.
    pub fn classify(err: AppError) -> Self {
        match err.kind {
            ErrorKind::NotFound | ErrorKind::Validation => Self::Permanent(err.to_string()),
            kind if kind.is_transient() => Self::Transient(err.to_string()),
            _ => Self::Internal(err),
        }
    }
}

/// Processes dispatch tasks.
#[derive(Debug, Clone)]
pub struct DispatchExecutor {
    orchestrator: Arc<NotificationOrchestrator>,
}

impl DispatchExecutor {
    /// Create a new executor
    pub fn new(orchestrator: Arc<NotificationOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Fan out the task's notification.
    pub async fn execute(&self, task: &DispatchTask) -> Result<DispatchSummary, JobExecutionError> {
        tracing::debug!(notification_id = %task.notification_id, "Executing dispatch");
        self.orchestrator
            .process(task.notification_id)
            .await
            .map_err(JobExecutionError::classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert!(matches!(
            JobExecutionError::classify(AppError::not_found("gone")),
            JobExecutionError::Permanent(_)
        ));
        assert!(matches!(
            JobExecutionError::classify(AppError::new(ErrorKind::Database, "timeout")),
            JobExecutionError::Transient(_)
        ));
        assert!(matches!(
            JobExecutionError::classify(AppError::internal("bug")),
            JobExecutionError::Internal(_)
        ));
    }
}
