//! Email channel over SMTP.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info, warn};

use notify_core::config::EmailConfig;
use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::Notification;
use notify_entity::recipient::RecipientContact;

use crate::channel::{Channel, ChannelMessage, SendOutcome};
use crate::error::ChannelError;

const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends plain-text mail through an SMTP relay.
///
/// A sender with no relay host or no from-address is still constructible,
/// so the channel can be registered, but every send fails with
/// [`ChannelError::NotConfigured`].
#[derive(Clone)]
pub struct EmailSender {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
    school_name: String,
    pacing: Duration,
}

impl EmailSender {
    /// Build a sender from its SMTP settings.
    pub fn new(config: &EmailConfig, school_name: impl Into<String>) -> Result<Self, ChannelError> {
        let transport = if config.smtp_host.trim().is_empty() {
            warn!("Email channel has no SMTP host; sends will fail");
            None
        } else {
            Some(build_transport(config)?)
        };

        let from = match config.from_address.trim() {
            "" => None,
            addr => Some(addr.parse::<Mailbox>().map_err(|e| {
                ChannelError::Build(format!("invalid from address '{addr}': {e}"))
            })?),
        };

        Ok(Self {
            transport,
            from,
            school_name: school_name.into(),
            pacing: Duration::from_millis(config.pacing_ms),
        })
    }

    /// Whether a relay and sender address are configured.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some() && self.from.is_some()
    }

    /// Build the RFC 5322 message for one recipient.
    pub fn build_message(&self, to: &str, message: &ChannelMessage) -> Result<Message, ChannelError> {
        let from = self
            .from
            .clone()
            .ok_or_else(|| ChannelError::not_configured("email", "from address missing"))?;
        let to = to
            .parse::<Mailbox>()
            .map_err(|_| ChannelError::InvalidDestination(to.to_string()))?;
        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone().unwrap_or_default())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| ChannelError::Build(e.to_string()))
    }

    /// Send one message.
    pub async fn deliver(&self, to: &str, message: &ChannelMessage) -> Result<(), ChannelError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| ChannelError::not_configured("email", "SMTP host missing"))?;
        let email = self.build_message(to, message)?;
        let response = transport
            .send(email)
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        debug!(to = %to, code = %response.code(), "SMTP accepted message");
        info!(to = %to, "Email sent");
        Ok(())
    }

    /// Send one message, reporting only whether it was accepted.
    pub async fn send_text(&self, to: &str, message: &ChannelMessage) -> bool {
        match self.deliver(to, message).await {
            Ok(()) => true,
            Err(e) => {
                error!(to = %to, error = %e, "Failed to send email");
                false
            }
        }
    }

    /// Send several messages one after another, pausing between them.
    pub async fn send_bulk(&self, messages: &BTreeMap<String, ChannelMessage>) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        for (i, (to, message)) in messages.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            results.insert(to.clone(), self.send_text(to, message).await);
        }
        results
    }
}

fn build_transport(config: &EmailConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, ChannelError> {
    let host = config.smtp_host.trim();
    let mut builder = if !config.use_tls {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
    } else if config.smtp_port == IMPLICIT_TLS_PORT {
        AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| ChannelError::Build(format!("SMTP relay '{host}': {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| ChannelError::Build(format!("SMTP relay '{host}': {e}")))?
    };
    builder = builder
        .port(config.smtp_port)
        .timeout(Some(Duration::from_secs(config.timeout_seconds)));
    if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }
    Ok(builder.build())
}

impl std::fmt::Debug for EmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSender")
            .field("configured", &self.is_configured())
            .field("from", &self.from.as_ref().map(ToString::to_string))
            .finish()
    }
}

#[async_trait]
impl Channel for EmailSender {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::Email
    }

    fn destination(&self, contact: &RecipientContact) -> Option<String> {
        contact.email().map(str::to_string)
    }

    fn render(&self, notification: &Notification, _contact: &RecipientContact) -> ChannelMessage {
        ChannelMessage {
            subject: Some(notification.title.clone()),
            body: format!(
                "{}\n\n--\n{}",
                notification.message, self.school_name
            ),
        }
    }

    async fn send(
        &self,
        destination: &str,
        message: &ChannelMessage,
    ) -> Result<SendOutcome, ChannelError> {
        self.deliver(destination, message).await?;
        Ok(SendOutcome::Sent)
    }

    fn pacing(&self) -> Duration {
        self.pacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_entity::notification::{CreateNotification, NotificationType, TargetAudience};
    use notify_entity::recipient::RecipientType;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.school.example".into(),
            from_address: "School Office <office@school.example>".into(),
            use_tls: false,
            ..EmailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_host_fails_closed() {
        let sender = EmailSender::new(
            &EmailConfig {
                from_address: "office@school.example".into(),
                ..EmailConfig::default()
            },
            "Greenfield",
        )
        .unwrap();
        assert!(!sender.is_configured());
        let err = sender
            .deliver("parent@example.in", &ChannelMessage::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_send_text_reports_false_when_unconfigured() {
        let sender = EmailSender::new(&EmailConfig::default(), "Greenfield").unwrap();
        assert!(!sender.send_text("parent@example.in", &ChannelMessage::text("hi")).await);

        let messages = BTreeMap::from([
            ("a@example.in".to_string(), ChannelMessage::text("one")),
            ("b@example.in".to_string(), ChannelMessage::text("two")),
        ]);
        let results = sender.send_bulk(&messages).await;
        assert_eq!(results.len(), 2);
        assert!(results.values().all(|ok| !ok));
    }

    #[tokio::test]
    async fn test_missing_from_fails_closed() {
        let sender = EmailSender::new(
            &EmailConfig {
                smtp_host: "smtp.school.example".into(),
                use_tls: false,
                ..EmailConfig::default()
            },
            "Greenfield",
        )
        .unwrap();
        let err = sender
            .build_message("parent@example.in", &ChannelMessage::text("hi"))
            .unwrap_err();
        assert!(matches!(err, ChannelError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_invalid_from_address_is_rejected() {
        let err = EmailSender::new(
            &EmailConfig {
                from_address: "not an address".into(),
                ..config()
            },
            "Greenfield",
        )
        .unwrap_err();
        assert!(matches!(err, ChannelError::Build(_)));
    }

    #[tokio::test]
    async fn test_builds_plain_text_message() {
        let sender = EmailSender::new(&config(), "Greenfield").unwrap();
        let n = Notification::scheduled(CreateNotification::new(
            "Annual Day",
            "Rehearsals start Monday",
            NotificationType::CulturalEvent,
            TargetAudience::AllParents,
        ));
        let contact = RecipientContact {
            recipient_id: 9,
            recipient_type: RecipientType::Parent,
            name: Some("Meera".into()),
            student_name: None,
            phone: None,
            email: Some(" meera@example.in ".into()),
        };

        let to = sender.destination(&contact).unwrap();
        assert_eq!(to, "meera@example.in");

        let rendered = sender.render(&n, &contact);
        assert_eq!(rendered.subject.as_deref(), Some("Annual Day"));
        assert!(rendered.body.ends_with("--\nGreenfield"));

        let raw = String::from_utf8(sender.build_message(&to, &rendered).unwrap().formatted()).unwrap();
        assert!(raw.contains("Subject: Annual Day"));
        assert!(raw.contains("To: meera@example.in"));
        assert!(raw.contains("Rehearsals start Monday"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_address() {
        let sender = EmailSender::new(&config(), "Greenfield").unwrap();
        let err = sender
            .build_message("nobody", &ChannelMessage::text("hi"))
            .unwrap_err();
        assert!(matches!(err, ChannelError::InvalidDestination(_)));
    }
}
