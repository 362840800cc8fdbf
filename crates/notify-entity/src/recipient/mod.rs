//! Recipient value objects.

pub mod contact;

pub use contact::{RecipientContact, RecipientType};
