//! # notify-channel
//!
//! Outbound delivery channels for School Notify. Every transport implements
//! the [`Channel`] trait and is looked up through a [`ChannelRegistry`]
//! keyed by [`DeliveryMethod`](notify_entity::delivery::DeliveryMethod).
//!
//! Provider settings come exclusively from the config structs in
//! `notify_core::config::channels`, passed to each sender's constructor.

pub mod channel;
pub mod email;
pub mod error;
pub mod in_app;
pub mod phone;
pub mod registry;
pub mod sms;
pub mod template;
pub mod whatsapp;

pub use channel::{Channel, ChannelMessage, SendOutcome};
pub use email::EmailSender;
pub use error::ChannelError;
pub use in_app::InAppChannel;
pub use phone::{is_valid_phone, normalize_phone};
pub use registry::ChannelRegistry;
pub use sms::SmsSender;
pub use whatsapp::{MediaType, WhatsAppSender};
