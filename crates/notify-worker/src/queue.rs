//! Dispatch queue: a bounded channel of notification ids.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use notify_core::error::AppError;
use notify_core::result::AppResult;
use notify_core::types::NotificationId;
use notify_service::{DispatchPublisher, DispatchTask};

type InFlight = Arc<DashSet<NotificationId>>;

/// Producer side of the dispatch queue.
///
/// A notification id stays in the in-flight set from `publish` until its
/// task has been processed, so publishing it again meanwhile is a no-op.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    sender: mpsc::Sender<DispatchTask>,
    in_flight: InFlight,
}

/// Consumer side of the dispatch queue, owned by the worker runner.
#[derive(Debug)]
pub struct DispatchReceiver {
    receiver: mpsc::Receiver<DispatchTask>,
    in_flight: InFlight,
}

/// A received task. Dropping it releases the notification id.
#[derive(Debug)]
pub struct QueuedTask {
    pub task: DispatchTask,
    in_flight: InFlight,
}

impl Drop for QueuedTask {
    fn drop(&mut self) {
        self.in_flight.remove(&self.task.notification_id);
    }
}

impl DispatchQueue {
    /// Create a queue holding at most `capacity` waiting tasks.
    pub fn new(capacity: usize) -> (Self, DispatchReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let in_flight = InFlight::default();
        (
            Self {
                sender,
                in_flight: Arc::clone(&in_flight),
            },
            DispatchReceiver {
                receiver,
                in_flight,
            },
        )
    }

    /// Number of notifications queued or being processed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether the notification is queued or being processed.
    pub fn is_in_flight(&self, id: NotificationId) -> bool {
        self.in_flight.contains(&id)
    }
}

#[async_trait]
impl DispatchPublisher for DispatchQueue {
    async fn publish(&self, task: DispatchTask) -> AppResult<bool> {
        let id = task.notification_id;
        if !self.in_flight.insert(id) {
            tracing::debug!(notification_id = %id, "Dispatch already in flight");
            return Ok(false);
        }

        match self.sender.try_send(task) {
            Ok(()) => {
                tracing::debug!(notification_id = %id, "Queued dispatch");
                Ok(true)
            }
            Err(e) => {
                self.in_flight.remove(&id);
                Err(match e {
                    TrySendError::Full(_) => AppError::service_unavailable("Dispatch queue is full"),
                    TrySendError::Closed(_) => {
                        AppError::service_unavailable("Dispatch queue is closed")
                    }
                })
            }
        }
    }
}

impl DispatchReceiver {
    /// Wait for the next task. Returns `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<QueuedTask> {
        let task = self.receiver.recv().await?;
        Some(QueuedTask {
            task,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Stop accepting new tasks; already queued tasks can still be received.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_core::error::ErrorKind;

    #[tokio::test]
    async fn test_duplicate_publish_is_noop_until_processed() {
        let (queue, mut rx) = DispatchQueue::new(8);
        let task = DispatchTask::new(NotificationId::new());

        assert!(queue.publish(task).await.unwrap());
        assert!(!queue.publish(task).await.unwrap());
        assert!(queue.is_in_flight(task.notification_id));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.task, task);
        // Still in flight while being processed.
        assert!(!queue.publish(task).await.unwrap());

        drop(received);
        assert_eq!(queue.in_flight(), 0);
        assert!(queue.publish(task).await.unwrap());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_and_releases_id() {
        let (queue, _rx) = DispatchQueue::new(1);
        queue.publish(DispatchTask::new(NotificationId::new())).await.unwrap();

        let overflow = DispatchTask::new(NotificationId::new());
        let err = queue.publish(overflow).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
        assert!(!queue.is_in_flight(overflow.notification_id));
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (queue, mut rx) = DispatchQueue::new(4);
        rx.close();
        let err = queue
            .publish(DispatchTask::new(NotificationId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }
}
