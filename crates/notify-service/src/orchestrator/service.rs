//! Notification orchestrator: accepts dispatch requests and fans each
//! notification out into per-recipient, per-channel deliveries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use notify_channel::{ChannelRegistry, SendOutcome};
use notify_core::error::AppError;
use notify_core::result::AppResult;
use notify_core::types::NotificationId;
use notify_database::{DeliveryStore, NotificationStore};
use notify_entity::delivery::{CreateDelivery, Delivery, DeliveryMethod, DeliveryStatus};
use notify_entity::notification::{
    Notification, NotificationStatus, NotificationType, Priority, TargetAudience,
};
use notify_entity::recipient::RecipientContact;

use super::publisher::{DispatchPublisher, DispatchTask};
use super::request::DispatchRequest;
use crate::recipient::{AudienceScope, RecipientResolver};

/// How a `process` call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Every send was issued; the notification is `SENT`.
    Sent,
    /// The notification was marked `FAILED` with this reason.
    Failed { reason: String },
    /// The notification was not `SCHEDULED`; nothing was done.
    Skipped { status: NotificationStatus },
}

/// Counts from one `process` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub notification_id: NotificationId,
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
    pub recipients: usize,
    pub deliveries: usize,
    pub sent: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Recipient/method pairs with no usable address.
    pub skipped_contacts: usize,
    /// Deliveries cancelled while the dispatch was running.
    pub cancelled: usize,
}

impl DispatchSummary {
    fn new(notification_id: NotificationId, outcome: DispatchOutcome) -> Self {
        Self {
            notification_id,
            outcome,
            recipients: 0,
            deliveries: 0,
            sent: 0,
            delivered: 0,
            failed: 0,
            skipped_contacts: 0,
            cancelled: 0,
        }
    }
}

/// Creates notifications and drives their fan-out.
#[derive(Clone)]
pub struct NotificationOrchestrator {
    notifications: Arc<dyn NotificationStore>,
    deliveries: Arc<dyn DeliveryStore>,
    resolver: RecipientResolver,
    channels: Arc<ChannelRegistry>,
    publisher: Arc<dyn DispatchPublisher>,
}

impl std::fmt::Debug for NotificationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationOrchestrator")
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl NotificationOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        deliveries: Arc<dyn DeliveryStore>,
        resolver: RecipientResolver,
        channels: Arc<ChannelRegistry>,
        publisher: Arc<dyn DispatchPublisher>,
    ) -> Self {
        Self {
            notifications,
            deliveries,
            resolver,
            channels,
            publisher,
        }
    }

    /// The registered channels.
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Validate and persist a notification, then queue it unless it is
    /// scheduled for later. The returned notification is still `SCHEDULED`.
    #[instrument(skip(self, request), fields(audience = %request.target_audience))]
    pub async fn dispatch(&self, request: DispatchRequest) -> AppResult<Notification> {
        let data = request.validate(&self.channels)?;
        let notification = self
            .notifications
            .insert(&Notification::scheduled(data))
            .await?;

        info!(
            notification_id = %notification.id,
            notification_type = %notification.notification_type,
            methods = ?notification.delivery_methods,
            "Notification created"
        );

        if notification.scheduled_at.is_some_and(|at| at > Utc::now()) {
            debug!(notification_id = %notification.id, "Dispatch deferred to schedule");
            return Ok(notification);
        }

        self.enqueue(notification.id).await;
        Ok(notification)
    }

    /// Publish a dispatch task. A publish failure is logged and the
    /// notification is left `SCHEDULED` for the promoter to pick up.
    pub async fn enqueue(&self, notification_id: NotificationId) -> bool {
        match self.publisher.publish(DispatchTask::new(notification_id)).await {
            Ok(queued) => {
                if !queued {
                    debug!(notification_id = %notification_id, "Dispatch already in flight");
                }
                queued
            }
            Err(e) => {
                warn!(
                    notification_id = %notification_id,
                    error = %e,
                    "Failed to queue dispatch; promoter will retry"
                );
                false
            }
        }
    }

    /// Fan a notification out to its recipients.
    ///
    /// Safe to run more than once: a notification that is no longer
    /// `SCHEDULED` is skipped and delivery rows are upserted.
    #[instrument(skip(self))]
    pub async fn process(&self, notification_id: NotificationId) -> AppResult<DispatchSummary> {
        let notification = self
            .notifications
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {notification_id} not found")))?;

        if notification.status != NotificationStatus::Scheduled {
            info!(
                notification_id = %notification_id,
                status = %notification.status,
                "Skipping dispatch of non-scheduled notification"
            );
            return Ok(DispatchSummary::new(
                notification_id,
                DispatchOutcome::Skipped {
                    status: notification.status,
                },
            ));
        }

        match self.fan_out(&notification).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                let reason = format!("orchestration_error: {}", e.message);
                error!(notification_id = %notification_id, error = %e, "Dispatch aborted");
                self.notifications.mark_failed(notification_id, &reason).await?;
                Ok(DispatchSummary::new(
                    notification_id,
                    DispatchOutcome::Failed { reason },
                ))
            }
        }
    }

    async fn fan_out(&self, notification: &Notification) -> AppResult<DispatchSummary> {
        let contacts = match self.resolver.resolve(&AudienceScope::from(notification)).await {
            Ok(contacts) => contacts,
            Err(e) => {
                let reason = e.to_string();
                warn!(notification_id = %notification.id, reason = %reason, "Recipient resolution failed");
                self.notifications.mark_failed(notification.id, &reason).await?;
                return Ok(DispatchSummary::new(
                    notification.id,
                    DispatchOutcome::Failed { reason },
                ));
            }
        };

        let mut summary = DispatchSummary::new(notification.id, DispatchOutcome::Sent);
        summary.recipients = contacts.len();

        for method in &notification.delivery_methods {
            self.send_method(notification, *method, &contacts, &mut summary)
                .await?;
        }

        if !self.notifications.mark_sent(notification.id).await? {
            let status = self
                .notifications
                .find_by_id(notification.id)
                .await?
                .map_or(NotificationStatus::Cancelled, |n| n.status);
            info!(
                notification_id = %notification.id,
                status = %status,
                sent = summary.sent,
                cancelled = summary.cancelled,
                "Notification withdrawn during dispatch"
            );
            summary.outcome = DispatchOutcome::Skipped { status };
            return Ok(summary);
        }
        info!(
            notification_id = %notification.id,
            recipients = summary.recipients,
            deliveries = summary.deliveries,
            sent = summary.sent,
            delivered = summary.delivered,
            failed = summary.failed,
            "Notification dispatched"
        );
        Ok(summary)
    }

    async fn send_method(
        &self,
        notification: &Notification,
        method: DeliveryMethod,
        contacts: &[RecipientContact],
        summary: &mut DispatchSummary,
    ) -> AppResult<()> {
        let channel = self.channels.get(method);

        let mut rows: Vec<(Delivery, &RecipientContact)> = Vec::with_capacity(contacts.len());
        for contact in contacts {
            let destination = match &channel {
                Some(channel) => match channel.destination(contact) {
                    Some(destination) => Some(destination),
                    None => {
                        summary.skipped_contacts += 1;
                        continue;
                    }
                },
                None => None,
            };
            let delivery = self
                .deliveries
                .upsert_pending(&CreateDelivery {
                    notification_id: notification.id,
                    recipient_id: contact.recipient_id,
                    recipient_type: contact.recipient_type,
                    delivery_method: method,
                    destination,
                })
                .await?;
            rows.push((delivery, contact));
        }
        summary.deliveries += rows.len();

        let pending = rows
            .into_iter()
            .filter(|(d, _)| d.status == DeliveryStatus::Pending);

        let Some(channel) = channel else {
            let reason = format!("no channel registered for {method}");
            for (delivery, _) in pending {
                if self.deliveries.mark_failed(delivery.id, &reason).await? {
                    summary.failed += 1;
                }
            }
            warn!(notification_id = %notification.id, method = %method, "No channel for method");
            return Ok(());
        };

        let pacing = channel.pacing();
        for (i, (delivery, contact)) in pending.enumerate() {
            if i > 0 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
            // A cancel may have landed since the rows were upserted.
            let still_pending = self
                .deliveries
                .find_by_id(delivery.id)
                .await?
                .is_some_and(|d| d.status == DeliveryStatus::Pending);
            if !still_pending {
                summary.cancelled += 1;
                continue;
            }

            let message = channel.render(notification, contact);
            let destination = delivery.destination.as_deref().unwrap_or_default();
            let settled = match channel.send(destination, &message).await {
                Ok(SendOutcome::Sent) => {
                    let settled = self.deliveries.mark_sent(delivery.id).await?;
                    summary.sent += usize::from(settled);
                    settled
                }
                Ok(SendOutcome::Delivered) => {
                    let settled = self.deliveries.mark_delivered(delivery.id).await?;
                    summary.delivered += usize::from(settled);
                    settled
                }
                Err(e) => {
                    warn!(
                        notification_id = %notification.id,
                        delivery_id = %delivery.id,
                        recipient_id = delivery.recipient_id,
                        method = %method,
                        error = %e,
                        "Delivery failed"
                    );
                    let settled = self.deliveries.mark_failed(delivery.id, &e.to_string()).await?;
                    summary.failed += usize::from(settled);
                    settled
                }
            };
            if !settled {
                warn!(
                    notification_id = %notification.id,
                    delivery_id = %delivery.id,
                    "Delivery cancelled while its send was in flight"
                );
                summary.cancelled += 1;
            }
        }
        Ok(())
    }

    // ── Convenience entry points ────────────────────────────────────

    /// Notify the parents of every active student.
    pub async fn send_to_all_parents(&self, mut request: DispatchRequest) -> AppResult<Notification> {
        request.target_audience = TargetAudience::AllParents;
        self.dispatch(request).await
    }

    /// Announce a holiday to all parents. The notice goes out now and
    /// carries the holiday date as its event date.
    pub async fn send_holiday(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        holiday_date: DateTime<Utc>,
        methods: Vec<DeliveryMethod>,
    ) -> AppResult<Notification> {
        let request = DispatchRequest::new(
            title,
            message,
            NotificationType::Holiday,
            TargetAudience::AllParents,
        )
        .with_priority(Priority::High)
        .with_methods(methods)
        .for_event(holiday_date);
        self.dispatch(request).await
    }

    /// Send a circular to all parents.
    pub async fn send_circular(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        methods: Vec<DeliveryMethod>,
    ) -> AppResult<Notification> {
        let request = DispatchRequest::new(
            title,
            message,
            NotificationType::Circular,
            TargetAudience::AllParents,
        )
        .with_methods(methods);
        self.dispatch(request).await
    }

    /// Send an urgent alert to all parents.
    pub async fn send_emergency(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        methods: Vec<DeliveryMethod>,
    ) -> AppResult<Notification> {
        let request = DispatchRequest::new(
            title,
            message,
            NotificationType::Emergency,
            TargetAudience::AllParents,
        )
        .with_priority(Priority::Urgent)
        .with_methods(methods);
        self.dispatch(request).await
    }

    /// Notify the parents of one class.
    pub async fn send_to_class(
        &self,
        class_id: i64,
        mut request: DispatchRequest,
    ) -> AppResult<Notification> {
        request.target_audience = TargetAudience::SpecificClass;
        request.class_id = Some(class_id);
        request.section = None;
        self.dispatch(request).await
    }

    /// Notify the parents of one section of a class.
    pub async fn send_to_class_section(
        &self,
        class_id: i64,
        section: impl Into<String>,
        mut request: DispatchRequest,
    ) -> AppResult<Notification> {
        request.target_audience = TargetAudience::SpecificClass;
        request.class_id = Some(class_id);
        request.section = Some(section.into());
        self.dispatch(request).await
    }

    /// Persist a notification for later dispatch. `scheduled_at` must be in
    /// the future.
    pub async fn schedule(&self, request: DispatchRequest) -> AppResult<Notification> {
        match request.scheduled_at {
            Some(at) if at > Utc::now() => self.dispatch(request).await,
            Some(_) => Err(AppError::validation("scheduled_at must be in the future")),
            None => Err(AppError::validation("scheduled_at is required")),
        }
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Withdraw a notification that has not been dispatched yet.
    pub async fn cancel(&self, notification_id: NotificationId) -> AppResult<Notification> {
        let notification = self
            .notifications
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {notification_id} not found")))?;

        if !notification.status.is_pending() || !self.notifications.cancel(notification_id).await? {
            return Err(AppError::conflict(format!(
                "Notification {notification_id} is {} and can no longer be cancelled",
                notification.status
            )));
        }

        let cancelled = self.deliveries.cancel_pending(notification_id).await?;
        info!(
            notification_id = %notification_id,
            cancelled_deliveries = cancelled,
            "Notification cancelled"
        );

        self.notifications
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {notification_id} not found")))
    }

    /// Delete a notification. Only undispatched notifications can be
    /// deleted; they are kept as `CANCELLED` so their history survives.
    pub async fn delete(&self, notification_id: NotificationId) -> AppResult<()> {
        self.cancel(notification_id).await.map(|_| ())
    }
}
