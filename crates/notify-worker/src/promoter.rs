//! Publishes scheduled notifications once they are due.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use notify_core::result::AppResult;
use notify_database::NotificationStore;
use notify_service::{DispatchPublisher, DispatchTask};

/// Counts from one promotion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PromotionReport {
    pub due: usize,
    pub published: usize,
    /// Already queued or running.
    pub in_flight: usize,
    /// Publish failed; retried next pass.
    pub failed: usize,
}

/// Moves due `SCHEDULED` notifications onto the dispatch queue.
///
/// Also republishes immediate notifications that have sat `SCHEDULED` for
/// longer than `stale_after`, which recovers dispatches lost to a restart.
#[derive(Clone)]
pub struct ScheduledPromoter {
    notifications: Arc<dyn NotificationStore>,
    publisher: Arc<dyn DispatchPublisher>,
    stale_after: Duration,
}

impl std::fmt::Debug for ScheduledPromoter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledPromoter")
            .field("stale_after", &self.stale_after)
            .finish_non_exhaustive()
    }
}

impl ScheduledPromoter {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        publisher: Arc<dyn DispatchPublisher>,
        stale_after_seconds: i64,
    ) -> Self {
        Self {
            notifications,
            publisher,
            stale_after: Duration::seconds(stale_after_seconds.max(0)),
        }
    }

    /// Run one promotion pass.
    pub async fn promote(&self) -> AppResult<PromotionReport> {
        let now = Utc::now();
        let due = self.notifications.find_due(now, now - self.stale_after).await?;
        let mut report = PromotionReport {
            due: due.len(),
            ..PromotionReport::default()
        };

        for notification in due {
            match self.publisher.publish(DispatchTask::new(notification.id)).await {
                Ok(true) => report.published += 1,
                Ok(false) => report.in_flight += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(notification_id = %notification.id, error = %e, "Failed to promote notification");
                }
            }
        }

        if report.due > 0 {
            tracing::info!(
                due = report.due,
                published = report.published,
                in_flight = report.in_flight,
                failed = report.failed,
                "Promoted scheduled notifications"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_database::MemoryNotificationStore;
    use notify_entity::notification::{CreateNotification, Notification, NotificationType, TargetAudience};
    use notify_service::testing::RecordingPublisher;

    fn notification(scheduled_at: Option<chrono::DateTime<Utc>>, age: Duration) -> Notification {
        let mut n = Notification::scheduled(CreateNotification::new(
            "Exam",
            "Timetable attached",
            NotificationType::ExamSchedule,
            TargetAudience::AllParents,
        ));
        n.scheduled_at = scheduled_at;
        n.created_at -= age;
        n
    }

    #[tokio::test]
    async fn test_promotes_due_and_stale_only() {
        let store = MemoryNotificationStore::new();
        let publisher = Arc::new(RecordingPublisher::default());
        let now = Utc::now();

        let due = store
            .insert(&notification(Some(now - Duration::minutes(1)), Duration::hours(1)))
            .await
            .unwrap();
        store
            .insert(&notification(Some(now + Duration::hours(1)), Duration::hours(1)))
            .await
            .unwrap();
        let stale = store
            .insert(&notification(None, Duration::minutes(10)))
            .await
            .unwrap();
        store
            .insert(&notification(None, Duration::seconds(5)))
            .await
            .unwrap();

        let promoter = ScheduledPromoter::new(Arc::new(store), publisher.clone(), 300);
        let report = promoter.promote().await.unwrap();
        assert_eq!(report.due, 2);
        assert_eq!(report.published, 2);

        let ids: Vec<_> = publisher.tasks().iter().map(|t| t.notification_id).collect();
        assert!(ids.contains(&due.id));
        assert!(ids.contains(&stale.id));

        let again = promoter.promote().await.unwrap();
        assert_eq!(again.in_flight, 2);
    }

    #[tokio::test]
    async fn test_publish_failure_is_counted() {
        let store = MemoryNotificationStore::new();
        store
            .insert(&notification(Some(Utc::now() - Duration::minutes(1)), Duration::zero()))
            .await
            .unwrap();
        let publisher = Arc::new(RecordingPublisher::default());
        publisher.set_broken(true);

        let report = ScheduledPromoter::new(Arc::new(store), publisher, 300)
            .promote()
            .await
            .unwrap();
        assert_eq!(report.failed, 1);
    }
}
