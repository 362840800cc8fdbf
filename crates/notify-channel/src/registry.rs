//! Delivery-method to channel mapping.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use notify_core::config::ChannelsConfig;
use notify_entity::delivery::DeliveryMethod;

use crate::channel::Channel;
use crate::email::EmailSender;
use crate::error::ChannelError;
use crate::in_app::InAppChannel;
use crate::sms::SmsSender;
use crate::whatsapp::WhatsAppSender;

/// Table of the channels available for dispatch.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: HashMap<DeliveryMethod, Arc<dyn Channel>>,
}

impl ChannelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every channel enabled in configuration.
    pub fn from_config(config: &ChannelsConfig) -> Result<Self, ChannelError> {
        let mut registry = Self::new();
        if config.in_app.enabled {
            registry.register(Arc::new(InAppChannel));
        }
        if config.sms.enabled {
            registry.register(Arc::new(SmsSender::new(
                config.sms.clone(),
                config.school_name.clone(),
                config.country_code.clone(),
            )?));
        }
        if config.whatsapp.enabled {
            registry.register(Arc::new(WhatsAppSender::new(
                config.whatsapp.clone(),
                config.country_code.clone(),
            )?));
        }
        if config.email.enabled {
            registry.register(Arc::new(EmailSender::new(
                &config.email,
                config.school_name.clone(),
            )?));
        }
        info!(methods = ?registry.methods(), "Channel registry initialized");
        Ok(registry)
    }

    /// Add or replace the channel for its delivery method.
    pub fn register(&mut self, channel: Arc<dyn Channel>) -> &mut Self {
        self.channels.insert(channel.method(), channel);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, channel: Arc<dyn Channel>) -> Self {
        self.register(channel);
        self
    }

    /// The channel for a delivery method, if one is registered.
    pub fn get(&self, method: DeliveryMethod) -> Option<Arc<dyn Channel>> {
        self.channels.get(&method).cloned()
    }

    /// Whether a channel is registered for the method.
    pub fn supports(&self, method: DeliveryMethod) -> bool {
        self.channels.contains_key(&method)
    }

    /// Registered methods in declaration order.
    pub fn methods(&self) -> Vec<DeliveryMethod> {
        DeliveryMethod::ALL
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_registers_enabled_channels() {
        let mut config = ChannelsConfig::default();
        config.email.enabled = false;

        let registry = ChannelRegistry::from_config(&config).unwrap();
        assert_eq!(
            registry.methods(),
            vec![DeliveryMethod::InApp, DeliveryMethod::Sms, DeliveryMethod::WhatsApp]
        );
        assert!(!registry.supports(DeliveryMethod::Push));
        assert!(registry.get(DeliveryMethod::Email).is_none());
    }

    #[test]
    fn test_register_replaces_by_method() {
        let registry = ChannelRegistry::new()
            .with(Arc::new(InAppChannel))
            .with(Arc::new(InAppChannel));
        assert_eq!(registry.methods(), vec![DeliveryMethod::InApp]);
        assert_eq!(
            registry.get(DeliveryMethod::InApp).map(|c| c.method()),
            Some(DeliveryMethod::InApp)
        );
    }
}
