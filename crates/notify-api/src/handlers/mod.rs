//! Route handlers organized by concern.

pub mod dispatch;
pub mod health;
pub mod mutation;
pub mod query;
pub mod whatsapp;
