//! In-app inbox channel.

use async_trait::async_trait;

use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::Notification;
use notify_entity::recipient::RecipientContact;

use crate::channel::{Channel, ChannelMessage, SendOutcome};
use crate::error::ChannelError;

/// Records the notification in the recipient's inbox.
///
/// No network call is made; the delivery row itself is the inbox entry and
/// its read state is tracked by the query service.
#[derive(Debug, Clone, Copy, Default)]
pub struct InAppChannel;

#[async_trait]
impl Channel for InAppChannel {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::InApp
    }

    fn destination(&self, contact: &RecipientContact) -> Option<String> {
        Some(contact.recipient_id.to_string())
    }

    fn render(&self, notification: &Notification, _contact: &RecipientContact) -> ChannelMessage {
        ChannelMessage {
            subject: Some(notification.title.clone()),
            body: notification.message.clone(),
        }
    }

    async fn send(
        &self,
        _destination: &str,
        _message: &ChannelMessage,
    ) -> Result<SendOutcome, ChannelError> {
        Ok(SendOutcome::Delivered)
    }
}
