//! Resolved recipient contact details.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use notify_core::AppError;

use crate::parse_variant;

/// Kind of person a delivery is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recipient_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientType {
    Student,
    Parent,
    Staff,
    Admin,
}

impl RecipientType {
    /// Every recipient type.
    pub const ALL: [Self; 4] = [Self::Student, Self::Parent, Self::Staff, Self::Admin];

    /// Return the type as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Parent => "PARENT",
            Self::Staff => "STAFF",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for RecipientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecipientType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_variant(s, &Self::ALL, Self::as_str, "recipient type")
    }
}

/// An addressable recipient produced by audience resolution.
///
/// `recipient_id` is the directory id of the student the contact was
/// derived from; parent contacts share their child's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientContact {
    pub recipient_id: i64,
    pub recipient_type: RecipientType,
    /// Display name of the person being contacted.
    pub name: Option<String>,
    /// Name of the student this contact relates to.
    pub student_name: Option<String>,
    /// Raw phone number as stored in the directory.
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl RecipientContact {
    /// Phone number, if present and not blank.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Email address, if present and plausibly valid.
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| e.contains('@') && !e.starts_with('@') && !e.ends_with('@'))
    }
}
