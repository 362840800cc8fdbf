//! Response DTOs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use notify_entity::delivery::DeliveryMethod;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Number of rows affected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// A selectable enum value for form dropdowns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumOption {
    pub value: &'static str,
    pub label: &'static str,
    /// Only set for delivery methods: whether a channel is registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl EnumOption {
    pub fn new(value: &'static str, label: &'static str) -> Self {
        Self {
            value,
            label,
            available: None,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// `up`, `down` or `not_configured`.
    pub database: String,
    /// Delivery methods with a registered channel.
    pub channels: Vec<DeliveryMethod>,
}

/// Result of a direct WhatsApp send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppSendResponse {
    pub phone_number: String,
    /// Provider message id.
    pub message_id: String,
}

/// Per-number outcome of a bulk send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSendResponse {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub results: BTreeMap<String, bool>,
}

impl From<BTreeMap<String, bool>> for BulkSendResponse {
    fn from(results: BTreeMap<String, bool>) -> Self {
        let sent = results.values().filter(|ok| **ok).count();
        Self {
            total: results.len(),
            sent,
            failed: results.len() - sent,
            results,
        }
    }
}

/// Outcome of requeueing dead-lettered deliveries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequeueAllResponse {
    pub requeued: usize,
}
