//! WhatsApp channel for the WhatsApp Business Cloud API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use notify_core::config::WhatsAppConfig;
use notify_entity::delivery::DeliveryMethod;
use notify_entity::notification::Notification;
use notify_entity::recipient::RecipientContact;

use crate::channel::{Channel, ChannelMessage, SendOutcome};
use crate::error::ChannelError;
use crate::phone::{is_valid_phone, normalize_phone};

const PLACEHOLDER_TOKENS: &[&str] = &["test_access_token", "your_access_token"];
const PLACEHOLDER_PHONE_IDS: &[&str] = &["test_phone_number_id", "your_phone_number_id"];

/// Kind of media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Document,
    Audio,
    Video,
}

impl MediaType {
    /// The Cloud API `type` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "document" => Ok(Self::Document),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(ChannelError::Build(format!(
                "unsupported media type '{other}', expected image, document, audio or video"
            ))),
        }
    }
}

/// A quick-reply button on an interactive message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

/// Body of an interactive button message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractiveMessage {
    pub header: Option<String>,
    pub body: String,
    pub footer: Option<String>,
    pub buttons: Vec<ReplyButton>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

/// Sends messages through `POST {api_url}/{phone_number_id}/messages`.
#[derive(Debug, Clone)]
pub struct WhatsAppSender {
    client: reqwest::Client,
    config: WhatsAppConfig,
    country_code: String,
}

impl WhatsAppSender {
    /// Build a sender from its provider settings.
    pub fn new(config: WhatsAppConfig, country_code: impl Into<String>) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ChannelError::Build(format!("WhatsApp HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            country_code: country_code.into(),
        })
    }

    /// Whether real credentials are present.
    pub fn is_configured(&self) -> bool {
        self.check_configured().is_ok()
    }

    fn check_configured(&self) -> Result<(), ChannelError> {
        let token = self.config.access_token.trim();
        let phone_id = self.config.phone_number_id.trim();
        if token.is_empty() || PLACEHOLDER_TOKENS.contains(&token) {
            return Err(ChannelError::not_configured("whatsapp", "access token missing"));
        }
        if phone_id.is_empty() || PLACEHOLDER_PHONE_IDS.contains(&phone_id) {
            return Err(ChannelError::not_configured("whatsapp", "phone number id missing"));
        }
        Ok(())
    }

    /// Normalized digits without `+`, or `None` if it is not a plausible phone number.
    pub fn format_destination(&self, raw: &str) -> Option<String> {
        is_valid_phone(raw).then(|| normalize_phone(raw, &self.country_code))
    }

    /// Plain text message payload.
    pub fn text_payload(to: &str, body: &str) -> Value {
        json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        })
    }

    /// Approved template payload with positional body parameters.
    pub fn template_payload(to: &str, name: &str, language: &str, parameters: &[String]) -> Value {
        let mut template = json!({
            "name": name,
            "language": { "code": language },
        });
        if !parameters.is_empty() {
            let params: Vec<Value> = parameters
                .iter()
                .map(|text| json!({ "type": "text", "text": text }))
                .collect();
            template["components"] = json!([{ "type": "body", "parameters": params }]);
        }
        json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": template,
        })
    }

    /// Media message payload.
    pub fn media_payload(to: &str, media_type: MediaType, link: &str, caption: Option<&str>) -> Value {
        let mut media = json!({ "link": link });
        if let Some(caption) = caption.filter(|c| !c.is_empty()) {
            media["caption"] = json!(caption);
        }
        let mut payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": media_type.as_str(),
        });
        payload[media_type.as_str()] = media;
        payload
    }

    /// Interactive reply-button payload.
    pub fn interactive_payload(to: &str, message: &InteractiveMessage) -> Value {
        let buttons: Vec<Value> = message
            .buttons
            .iter()
            .map(|b| json!({ "type": "reply", "reply": { "id": b.id, "title": b.title } }))
            .collect();
        let mut interactive = json!({
            "type": "button",
            "body": { "text": message.body },
            "action": { "buttons": buttons },
        });
        if let Some(header) = &message.header {
            interactive["header"] = json!({ "type": "text", "text": header });
        }
        if let Some(footer) = &message.footer {
            interactive["footer"] = json!({ "text": footer });
        }
        json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "interactive",
            "interactive": interactive,
        })
    }

    async fn post(&self, payload: &Value) -> Result<String, ChannelError> {
        self.check_configured()?;
        let url = format!(
            "{}/{}/messages",
            self.config.api_url.trim_end_matches('/'),
            self.config.phone_number_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(payload)
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
        Ok(response
            .json::<SendResponse>()
            .await
            .ok()
            .and_then(|r| r.messages.into_iter().next())
            .map(|m| m.id)
            .unwrap_or_default())
    }

    fn require_destination(&self, to: &str) -> Result<String, ChannelError> {
        self.format_destination(to)
            .ok_or_else(|| ChannelError::InvalidDestination(to.to_string()))
    }

    /// Send a plain text message.
    pub async fn deliver_text(&self, to: &str, body: &str) -> Result<String, ChannelError> {
        let to = self.require_destination(to)?;
        let id = self.post(&Self::text_payload(&to, body)).await?;
        info!(to = %to, message_id = %id, "WhatsApp message sent");
        Ok(id)
    }

    /// Send an approved template. `language` falls back to the configured default.
    pub async fn deliver_template(
        &self,
        to: &str,
        name: &str,
        language: Option<&str>,
        parameters: &[String],
    ) -> Result<String, ChannelError> {
        let to = self.require_destination(to)?;
        let language = language.unwrap_or(self.config.default_language.as_str());
        let id = self
            .post(&Self::template_payload(&to, name, language, parameters))
            .await?;
        info!(to = %to, template = %name, message_id = %id, "WhatsApp template sent");
        Ok(id)
    }

    /// Send a media attachment.
    pub async fn deliver_media(
        &self,
        to: &str,
        media_type: MediaType,
        link: &str,
        caption: Option<&str>,
    ) -> Result<String, ChannelError> {
        let to = self.require_destination(to)?;
        let id = self
            .post(&Self::media_payload(&to, media_type, link, caption))
            .await?;
        info!(to = %to, media_type = %media_type, message_id = %id, "WhatsApp media sent");
        Ok(id)
    }

    /// Send an interactive reply-button message.
    pub async fn deliver_interactive(
        &self,
        to: &str,
        message: &InteractiveMessage,
    ) -> Result<String, ChannelError> {
        if message.buttons.is_empty() || message.buttons.len() > 3 {
            return Err(ChannelError::Build(
                "interactive messages need between 1 and 3 buttons".to_string(),
            ));
        }
        let to = self.require_destination(to)?;
        let id = self.post(&Self::interactive_payload(&to, message)).await?;
        info!(to = %to, message_id = %id, "WhatsApp interactive message sent");
        Ok(id)
    }

    /// Send a plain text message. Failures are logged and reported as `false`.
    pub async fn send_text(&self, to: &str, body: &str) -> bool {
        log_outcome("text", to, self.deliver_text(to, body).await)
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
            warn!(total = results.len(), failed, "Bulk WhatsApp finished with failures");
        }
        results
    }
}

fn log_outcome(kind: &str, to: &str, result: Result<String, ChannelError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            error!(to = %to, kind, error = %e, "Failed to send WhatsApp message");
            false
        }
    }
}

#[async_trait]
impl Channel for WhatsAppSender {
    fn method(&self) -> DeliveryMethod {
        DeliveryMethod::WhatsApp
    }

    fn destination(&self, contact: &RecipientContact) -> Option<String> {
        contact.phone().and_then(|p| self.format_destination(p))
    }

    fn render(&self, notification: &Notification, _contact: &RecipientContact) -> ChannelMessage {
        ChannelMessage::text(format!("*{}*\n{}", notification.title, notification.message))
    }

    async fn send(
        &self,
        destination: &str,
        message: &ChannelMessage,
    ) -> Result<SendOutcome, ChannelError> {
        self.deliver_text(destination, &message.body).await?;
        Ok(SendOutcome::Sent)
    }

    fn pacing(&self) -> Duration {
        Duration::from_millis(self.config.pacing_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use notify_entity::notification::{CreateNotification, NotificationType, TargetAudience};
    use notify_entity::recipient::RecipientType;

    type Captured = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn spawn_graph_api(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/{phone_id}/messages",
                post(
                    move |State(seen): State<Captured>,
                          Path(phone_id): Path<String>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        seen.lock().unwrap().push((phone_id, auth, body));
                        (status, Json(json!({ "messages": [{ "id": "wamid.1" }] })))
                    },
                ),
            )
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), captured)
    }

    fn config(api_url: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            api_url: api_url.to_string(),
            phone_number_id: "1122".into(),
            access_token: "EAAG".into(),
            pacing_ms: 0,
            ..WhatsAppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_text_message_uses_bearer_token() {
        let (url, captured) = spawn_graph_api(StatusCode::OK).await;
        let sender = WhatsAppSender::new(config(&url), "91").unwrap();

        let id = sender.deliver_text("+91 98765 43210", "Hello").await.unwrap();
        assert_eq!(id, "wamid.1");

        let seen = captured.lock().unwrap();
        let (phone_id, auth, body) = &seen[0];
        assert_eq!(phone_id, "1122");
        assert_eq!(auth.as_deref(), Some("Bearer EAAG"));
        assert_eq!(body["to"], "919876543210");
        assert_eq!(body["type"], "text");
        assert_eq!(body["text"]["body"], "Hello");
    }

    #[tokio::test]
    async fn test_template_defaults_language() {
        let (url, captured) = spawn_graph_api(StatusCode::OK).await;
        let sender = WhatsAppSender::new(config(&url), "91").unwrap();

        sender
            .deliver_template("9876543210", "fee_due", None, &["Rs 500".to_string()])
            .await
            .unwrap();

        let body = &captured.lock().unwrap()[0].2;
        assert_eq!(body["template"]["name"], "fee_due");
        assert_eq!(body["template"]["language"]["code"], "en");
        assert_eq!(body["template"]["components"][0]["parameters"][0]["text"], "Rs 500");
    }

    #[tokio::test]
    async fn test_placeholder_token_fails_closed() {
        let (url, captured) = spawn_graph_api(StatusCode::OK).await;
        let mut cfg = config(&url);
        cfg.access_token = "test_access_token".into();
        let sender = WhatsAppSender::new(cfg, "91").unwrap();

        assert!(!sender.send_text("9876543210", "Hello").await);
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_carries_status() {
        let (url, _) = spawn_graph_api(StatusCode::UNAUTHORIZED).await;
        let sender = WhatsAppSender::new(config(&url), "91").unwrap();
        let err = sender.deliver_text("9876543210", "Hello").await.unwrap_err();
        assert!(matches!(err, ChannelError::Rejected { status: 401, .. }));
    }

    #[test]
    fn test_media_payload_omits_empty_caption() {
        let payload =
            WhatsAppSender::media_payload("919876543210", MediaType::Document, "https://x/y.pdf", Some(""));
        assert_eq!(payload["type"], "document");
        assert_eq!(payload["document"]["link"], "https://x/y.pdf");
        assert!(payload["document"].get("caption").is_none());
    }

    #[test]
    fn test_interactive_payload() {
        let payload = WhatsAppSender::interactive_payload(
            "919876543210",
            &InteractiveMessage {
                header: Some("PTA".into()),
                body: "Will you attend?".into(),
                footer: None,
                buttons: vec![
                    ReplyButton { id: "yes".into(), title: "Yes".into() },
                    ReplyButton { id: "no".into(), title: "No".into() },
                ],
            },
        );
        assert_eq!(payload["interactive"]["type"], "button");
        assert_eq!(payload["interactive"]["header"]["text"], "PTA");
        assert_eq!(payload["interactive"]["action"]["buttons"][1]["reply"]["id"], "no");
        assert!(payload["interactive"].get("footer").is_none());
    }

    #[test]
    fn test_render_bolds_title() {
        let sender = WhatsAppSender::new(config("http://unused"), "91").unwrap();
        let n = Notification::scheduled(CreateNotification::new(
            "Sports Day",
            "Friday on the main ground",
            NotificationType::SportsEvent,
            TargetAudience::AllParents,
        ));
        let contact = RecipientContact {
            recipient_id: 5,
            recipient_type: RecipientType::Parent,
            name: None,
            student_name: None,
            phone: Some("09876543210".into()),
            email: None,
        };
        assert_eq!(
            sender.render(&n, &contact).body,
            "*Sports Day*\nFriday on the main ground"
        );
        assert_eq!(sender.destination(&contact).as_deref(), Some("919876543210"));
    }

    #[test]
    fn test_media_type_parse() {
        assert_eq!("IMAGE".parse::<MediaType>().unwrap(), MediaType::Image);
        assert!("gif".parse::<MediaType>().is_err());
    }
}
