//! Notifier registry for managing named channels.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{NotifierConfig, NotifiersConfig};
use crate::error::ConfigError;

use super::{ChatNotifier, Notifier, WebhookNotifier};

/// Registry of named notifiers with destination validation.
#[derive(Debug, Default)]
pub struct NotifierRegistry {
    notifiers: HashMap<String, Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self {
            notifiers: HashMap::new(),
        }
    }

    /// Register a notifier by name.
    ///
    /// # Errors
    /// Fails if a notifier with the same name already exists.
    pub fn register(&mut self, notifier: Arc<dyn Notifier>) -> Result<(), ConfigError> {
        let name = notifier.name().to_string();
        if self.notifiers.contains_key(&name) {
            return Err(ConfigError::ValidationError(format!(
                "notifier '{}' already registered",
                name
            )));
        }
        self.notifiers.insert(name, notifier);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Notifier>> {
        self.notifiers.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.notifiers.keys().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Validate that every destination name exists in the registry.
    pub fn validate_destinations(&self, names: &[String]) -> Result<(), ConfigError> {
        let unknown: Vec<_> = names
            .iter()
            .filter(|name| !self.notifiers.contains_key(*name))
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(format!(
                "unknown notifiers referenced: {}",
                unknown
                    .iter()
                    .map(|s| format!("'{}'", s))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// Build a registry from the `notifiers:` config section.
    ///
    /// All instantiation errors are collected rather than stopping at
    /// the first one.
    pub fn from_config(
        notifiers_config: &NotifiersConfig,
        http_client: reqwest::Client,
    ) -> Result<Self, Vec<ConfigError>> {
        let mut registry = NotifierRegistry::new();
        let mut errors = Vec::new();

        for (name, config) in notifiers_config {
            match Self::create_notifier(name, config, &http_client) {
                Ok(notifier) => {
                    if let Err(e) = registry.register(notifier) {
                        errors.push(e);
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(registry)
        } else {
            Err(errors)
        }
    }

    fn create_notifier(
        name: &str,
        config: &NotifierConfig,
        http_client: &reqwest::Client,
    ) -> Result<Arc<dyn Notifier>, ConfigError> {
        match config {
            NotifierConfig::Chat(chat) => {
                if chat.url.is_empty() {
                    return Err(ConfigError::InvalidNotifier {
                        name: name.to_string(),
                        message: "url must not be empty".to_string(),
                    });
                }
                let notifier =
                    ChatNotifier::new(name.to_string(), chat.url.clone(), http_client.clone());
                tracing::info!(
                    notifier_name = %name,
                    notifier_type = "chat",
                    "Registered notifier from config"
                );
                Ok(Arc::new(notifier))
            }
            NotifierConfig::Webhook(webhook) => {
                if webhook.url.is_empty() {
                    return Err(ConfigError::InvalidNotifier {
                        name: name.to_string(),
                        message: "url must not be empty".to_string(),
                    });
                }
                let notifier = WebhookNotifier::new(
                    name.to_string(),
                    webhook.url.clone(),
                    http_client.clone(),
                );
                tracing::info!(
                    notifier_name = %name,
                    notifier_type = "webhook",
                    "Registered notifier from config"
                );
                Ok(Arc::new(notifier))
            }
        }
    }
}
