//! Delivery status and channel enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use notify_core::AppError;

use crate::parse_variant;

/// Transport used for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_method", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    /// In-app inbox; tracked by read state.
    InApp,
    Email,
    Sms,
    /// Mobile push. Accepted by the schema, no channel is registered for it.
    Push,
    #[serde(rename = "WHATSAPP")]
    #[sqlx(rename = "whatsapp")]
    WhatsApp,
}

impl DeliveryMethod {
    /// Every delivery method, in declaration order.
    pub const ALL: [Self; 5] = [Self::InApp, Self::Email, Self::Sms, Self::Push, Self::WhatsApp];

    /// Return the method as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "IN_APP",
            Self::Email => "EMAIL",
            Self::Sms => "SMS",
            Self::Push => "PUSH",
            Self::WhatsApp => "WHATSAPP",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InApp => "In-App",
            Self::Email => "Email",
            Self::Sms => "SMS",
            Self::Push => "Push Notification",
            Self::WhatsApp => "WhatsApp",
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "delivery method")
    }
}

/// Status of a single delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// Created, not yet attempted.
    Pending,
    /// Accepted by the provider.
    Sent,
    /// Confirmed delivered (in-app deliveries land here directly).
    Delivered,
    /// Opened by the recipient.
    Read,
    /// Last attempt failed; eligible for retry below the ceiling.
    Failed,
    /// Withdrawn with its notification.
    Cancelled,
    /// Retry budget exhausted; needs manual handling.
    DeadLettered,
}

impl DeliveryStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Sent,
        Self::Delivered,
        Self::Read,
        Self::Failed,
        Self::Cancelled,
        Self::DeadLettered,
    ];

    /// Whether the recipient has the message (counts towards the success rate).
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Delivered | Self::Read)
    }

    /// Whether the sweeper will never touch this delivery again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Read | Self::Cancelled | Self::DeadLettered
        )
    }

    /// Return the status as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Delivered => "DELIVERED",
            Self::Read => "READ",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::DeadLettered => "DEAD_LETTERED",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "delivery status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_wire_name() {
        let json = serde_json::to_string(&DeliveryMethod::WhatsApp).unwrap();
        assert_eq!(json, "\"WHATSAPP\"");
        assert_eq!(
            "whatsapp".parse::<DeliveryMethod>().unwrap(),
            DeliveryMethod::WhatsApp
        );
        assert_eq!("in-app".parse::<DeliveryMethod>().unwrap(), DeliveryMethod::InApp);
    }

    #[test]
    fn test_successful_statuses() {
        assert!(DeliveryStatus::Delivered.is_successful());
        assert!(DeliveryStatus::Read.is_successful());
        assert!(!DeliveryStatus::Sent.is_successful());
        assert!(!DeliveryStatus::DeadLettered.is_successful());
    }

    #[test]
    fn test_dead_lettered_is_terminal() {
        assert!(DeliveryStatus::DeadLettered.is_terminal());
        assert!(!DeliveryStatus::Failed.is_terminal());
    }
}
