//! Outbound channel provider configuration.
//!
//! Each provider gets its own struct which is handed to the matching
//! sender constructor at startup. Senders never read configuration from
//! anywhere else.

use serde::{Deserialize, Serialize};

/// Settings shared by all channels plus one section per provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// School name substituted into message templates.
    #[serde(default = "default_school_name")]
    pub school_name: String,
    /// Country calling code (digits only) used when normalizing phone numbers.
    #[serde(default = "default_country_code")]
    pub country_code: String,
    /// SMS gateway.
    #[serde(default)]
    pub sms: SmsConfig,
    /// WhatsApp Cloud API.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    /// SMTP email.
    #[serde(default)]
    pub email: EmailConfig,
    /// In-app inbox.
    #[serde(default)]
    pub in_app: InAppConfig,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            school_name: default_school_name(),
            country_code: default_country_code(),
            sms: SmsConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            email: EmailConfig::default(),
            in_app: InAppConfig::default(),
        }
    }
}

/// Twilio-compatible SMS gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Whether the SMS channel is registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Accounts endpoint; the account SID and `Messages.json` are appended.
    #[serde(default = "default_sms_api_url")]
    pub api_url: String,
    /// Account SID, also the basic-auth user.
    #[serde(default)]
    pub account_sid: String,
    /// Auth token, the basic-auth password.
    #[serde(default)]
    pub auth_token: String,
    /// Sender number in E.164 format.
    #[serde(default)]
    pub from_number: String,
    /// Delay between sequential sends in milliseconds.
    #[serde(default = "default_sms_pacing")]
    pub pacing_ms: u64,
    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_sms_api_url(),
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            pacing_ms: default_sms_pacing(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// WhatsApp Business Cloud API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Whether the WhatsApp channel is registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Graph API base URL including the version segment.
    #[serde(default = "default_whatsapp_api_url")]
    pub api_url: String,
    /// Sending phone number ID.
    #[serde(default)]
    pub phone_number_id: String,
    /// Bearer access token.
    #[serde(default)]
    pub access_token: String,
    /// Business account ID (informational).
    #[serde(default)]
    pub business_account_id: String,
    /// Language code used for template messages when none is given.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Delay between sequential sends in milliseconds.
    #[serde(default = "default_whatsapp_pacing")]
    pub pacing_ms: u64,
    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_whatsapp_api_url(),
            phone_number_id: String::new(),
            access_token: String::new(),
            business_account_id: String::new(),
            default_language: default_language(),
            pacing_ms: default_whatsapp_pacing(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// SMTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether the email channel is registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// Use STARTTLS/TLS when talking to the relay.
    #[serde(default = "default_true")]
    pub use_tls: bool,
    /// Sender mailbox, e.g. `School Office <office@school.example>`.
    #[serde(default)]
    pub from_address: String,
    /// Delay between sequential sends in milliseconds.
    #[serde(default = "default_email_pacing")]
    pub pacing_ms: u64,
    /// SMTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            use_tls: true,
            from_address: String::new(),
            pacing_ms: default_email_pacing(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// In-app inbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InAppConfig {
    /// Whether in-app deliveries are recorded.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for InAppConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_school_name() -> String {
    "School".to_string()
}

fn default_country_code() -> String {
    "91".to_string()
}

fn default_sms_api_url() -> String {
    "https://api.twilio.com/2010-04-01/Accounts".to_string()
}

fn default_whatsapp_api_url() -> String {
    "https://graph.facebook.com/v17.0".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_sms_pacing() -> u64 {
    100
}

fn default_whatsapp_pacing() -> u64 {
    200
}

fn default_email_pacing() -> u64 {
    50
}

fn default_timeout() -> u64 {
    15
}
