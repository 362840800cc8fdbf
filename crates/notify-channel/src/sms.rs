//! SMS channel for a Twilio-compatible gateway.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};

use notify_core::config::SmsConfig;
use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::Notification;
use notify_entity::recipient::RecipientContact;

use crate::channel::{Channel, ChannelMessage, SendOutcome};
use crate::error::ChannelError;
use crate::phone::{is_valid_phone, normalize_phone};
use crate::template::{self, DEFAULT_TEMPLATE};

const PLACEHOLDER_SIDS: &[&str] = &["your_account_sid", "test_account_sid"];
const PLACEHOLDER_TOKENS: &[&str] = &["your_auth_token", "test_auth_token"];

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

/// Sends text messages through `POST {api_url}/{account_sid}/Messages.json`.
#[derive(Debug, Clone)]
pub struct SmsSender {
    client: reqwest::Client,
    config: SmsConfig,
    school_name: String,
    country_code: String,
}

impl SmsSender {
    /// Build a sender from its provider settings.
    pub fn new(
        config: SmsConfig,
        school_name: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ChannelError::Build(format!("SMS HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            school_name: school_name.into(),
            country_code: country_code.into(),
        })
    }

    /// Whether real credentials are present.
    pub fn is_configured(&self) -> bool {
        self.check_configured().is_ok()
    }

    fn check_configured(&self) -> Result<(), ChannelError> {
        let sid = self.config.account_sid.trim();
        let token = self.config.auth_token.trim();
        if sid.is_empty() || PLACEHOLDER_SIDS.contains(&sid) {
            return Err(ChannelError::not_configured("sms", "account SID missing"));
        }
        if token.is_empty() || PLACEHOLDER_TOKENS.contains(&token) {
            return Err(ChannelError::not_configured("sms", "auth token missing"));
        }
        if self.config.from_number.trim().is_empty() {
            return Err(ChannelError::not_configured("sms", "sender number missing"));
        }
        Ok(())
    }

    /// `+` followed by the normalized number, or `None` if it is not a plausible phone number.
    pub fn format_destination(&self, raw: &str) -> Option<String> {
        is_valid_phone(raw).then(|| format!("+{}", normalize_phone(raw, &self.country_code)))
    }

    /// Send one text, reporting the provider outcome.
    pub async fn deliver(&self, to: &str, body: &str) -> Result<(), ChannelError> {
        self.check_configured()?;
        let to = self
            .format_destination(to)
            .ok_or_else(|| ChannelError::InvalidDestination(to.to_string()))?;

        let url = format!(
            "{}/{}/Messages.json",
            self.config.api_url.trim_end_matches('/'),
            self.config.account_sid
        );
        let form = [
            ("To", to.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sid = response
            .json::<MessageResource>()
            .await
            .ok()
            .and_then(|m| m.sid)
            .unwrap_or_default();
        info!(to = %to, sid = %sid, "SMS sent");
        Ok(())
    }

    /// Send one text. Failures are logged and reported as `false`.
    pub async fn send_text(&self, to: &str, body: &str) -> bool {
        match self.deliver(to, body).await {
            Ok(()) => true,
            Err(e) => {
                error!(to = %to, error = %e, "Failed to send SMS");
                false
            }
        }
    }

    /// Send several texts one after another, pausing between them.
    pub async fn send_bulk(&self, messages: &BTreeMap<String, String>) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        for (i, (to, body)) in messages.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pacing()).await;
            }
            results.insert(to.clone(), self.send_text(to, body).await);
        }
        let failed = results.values().filter(|ok| !**ok).count();
        if failed > 0 {
            warn!(total = results.len(), failed, "Bulk SMS finished with failures");
        }
        results
    }

    /// Render a named template and send it.
    pub async fn send_template(
        &self,
        to: &str,
        template_name: &str,
        vars: &HashMap<String, String>,
    ) -> bool {
        let body = Self::template_message(template_name, vars);
        self.send_text(to, &body).await
    }

    /// Render a named template with the given variables.
    pub fn template_message(template_name: &str, vars: &HashMap<String, String>) -> String {
        template::render(template::sms_template(template_name), vars)
    }

    fn variables(&self, notification: &Notification, contact: &RecipientContact) -> HashMap<String, String> {
        let mut vars = HashMap::from([
            ("title".to_string(), notification.title.clone()),
            ("message".to_string(), notification.message.clone()),
            ("school_name".to_string(), self.school_name.clone()),
        ]);
        if let Some(name) = &contact.student_name {
            vars.insert("student_name".to_string(), name.clone());
        }
        vars
    }
}

#[async_trait]
impl Channel for SmsSender {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::Sms
    }

    fn destination(&self, contact: &RecipientContact) -> Option<String> {
        contact.phone().and_then(|p| self.format_destination(p))
    }

    fn render(&self, notification: &Notification, contact: &RecipientContact) -> ChannelMessage {
        let vars = self.variables(notification, contact);
        let template = notification
            .notification_type
            .sms_template()
            .map(template::sms_template)
            .unwrap_or(DEFAULT_TEMPLATE);
        let body = template::render_complete(template, &vars)
            .unwrap_or_else(|| template::render(DEFAULT_TEMPLATE, &vars));
        ChannelMessage::text(body)
    }

    async fn send(
        &self,
        destination: &str,
        message: &ChannelMessage,
    ) -> Result<SendOutcome, ChannelError> {
        self.deliver(destination, &message.body).await?;
        Ok(SendOutcome::Sent)
    }

    fn pacing(&self) -> Duration {
        Duration::from_millis(self.config.pacing_ms)
    }
}
