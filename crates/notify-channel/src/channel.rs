//! The channel abstraction shared by every transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::Notification;
use notify_entity::recipient::RecipientContact;

use crate::error::ChannelError;

/// A message rendered for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Subject line, for channels that have one.
    pub subject: Option<String>,
    pub body: String,
}

impl ChannelMessage {
    /// A message with only a body.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            subject: None,
            body: body.into(),
        }
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the provider.
    Sent,
    /// Already in the recipient's hands (no provider involved).
    Delivered,
}

/// One outbound transport.
///
/// Implementations own their message formatting and address rules, so the
/// orchestrator never branches on the delivery method.
#[async_trait]
pub trait Channel: Send + Sync + 'static {
    /// The delivery method this channel serves.
    fn method(&self) -> DeliveryMethod;

    /// The address this channel would use for the contact, or `None` when
    /// the contact has no usable address for it.
    fn destination(&self, contact: &RecipientContact) -> Option<String>;

    /// Format the notification for this channel.
    fn render(&self, notification: &Notification, contact: &RecipientContact) -> ChannelMessage;

    /// Deliver one message to one destination.
    async fn send(
        &self,
        destination: &str,
        message: &ChannelMessage,
    ) -> Result<SendOutcome, ChannelError>;

    /// Delay to leave between sequential sends.
    fn pacing(&self) -> Duration {
        Duration::ZERO
    }
}
