//! Configuration loading and fail-fast validation.
//!
//! The YAML file configures the tick source, cooldown window, weather
//! provider endpoint, named notification channels and default
//! destinations. Everything is validated up front so a bad deployment
//! fails at startup instead of silently never alerting.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::alert::validate_operator;
use crate::error::ConfigError;
use crate::storage::{AlertConfig, User};
use crate::subscription::{MATCH_WINDOW_MINUTES, Subscription, validate_time_of_day};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/skysentry/config.yaml";

/// Main configuration structure for skysentry.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Tick source and per-call timeouts.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Alert cooldown window.
    #[serde(default)]
    pub cooldown: CooldownConfig,
    /// Weather provider endpoint.
    pub provider: ProviderConfig,
    /// Named notification channels.
    pub notifiers: NotifiersConfig,
    /// Defaults applied to every dispatch.
    pub defaults: DefaultsConfig,
    /// Metrics exposition configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Users, alert configs and subscriptions served from memory.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Data set loaded into the in-memory storage at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub users: Vec<User>,
    /// Alert configs keyed by user id.
    #[serde(default)]
    pub alert_configs: HashMap<String, Vec<AlertConfig>>,
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

/// Scheduler tick and timeout settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between ticks. Must not exceed the subscription match
    /// window or daily digests can be skipped entirely.
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,
    /// Bound on a single weather fetch.
    #[serde(with = "humantime_serde", default = "default_call_timeout")]
    pub fetch_timeout: Duration,
    /// Bound on a single dispatch enqueue + send.
    #[serde(with = "humantime_serde", default = "default_call_timeout")]
    pub dispatch_timeout: Duration,
    /// Upper bound on users processed concurrently within a tick.
    #[serde(default = "default_max_concurrent_users")]
    pub max_concurrent_users: usize,
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_concurrent_users() -> usize {
    8
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            fetch_timeout: default_call_timeout(),
            dispatch_timeout: default_call_timeout(),
            max_concurrent_users: default_max_concurrent_users(),
        }
    }
}

/// Cooldown window configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownConfig {
    /// Minimum interval between repeat alerts for one key.
    #[serde(with = "humantime_serde", default = "default_cooldown_period")]
    pub period: Duration,
}

fn default_cooldown_period() -> Duration {
    Duration::from_secs(60 * 60)
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            period: default_cooldown_period(),
        }
    }
}

/// Weather provider endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL answering `GET ?lat=..&lon=..` with current metrics.
    pub url: String,
}

/// Defaults applied to every dispatch.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    /// Notifier names every alert and digest is sent to.
    pub destinations: Vec<String>,
}

/// Metrics exposition configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

/// Named notifier configurations.
pub type NotifiersConfig = HashMap<String, NotifierConfig>;

/// One notification channel definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    Chat(ChatNotifierConfig),
    Webhook(WebhookNotifierConfig),
}

/// Direct chat channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatNotifierConfig {
    pub url: String,
}

/// Webhook channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotifierConfig {
    pub url: String,
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// # Errors
    /// Returns [`ConfigError::LoadError`] if the file cannot be read,
    /// [`ConfigError::ValidationError`] if the YAML is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Validate the whole configuration, collecting every error.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.scheduler.tick_interval.is_zero() {
            errors.push(ConfigError::ValidationError(
                "scheduler.tick_interval must be greater than zero".to_string(),
            ));
        }

        // The subscription match window is forward-only and
        // MATCH_WINDOW_MINUTES wide; a coarser tick can jump over it.
        let window = Duration::from_secs(u64::from(MATCH_WINDOW_MINUTES) * 60);
        if self.scheduler.tick_interval > window {
            errors.push(ConfigError::ValidationError(format!(
                "scheduler.tick_interval must not exceed the {}-minute digest match window",
                MATCH_WINDOW_MINUTES
            )));
        }

        if self.scheduler.fetch_timeout.is_zero() {
            errors.push(ConfigError::ValidationError(
                "scheduler.fetch_timeout must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.dispatch_timeout.is_zero() {
            errors.push(ConfigError::ValidationError(
                "scheduler.dispatch_timeout must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.max_concurrent_users == 0 {
            errors.push(ConfigError::ValidationError(
                "scheduler.max_concurrent_users must be greater than zero".to_string(),
            ));
        }

        if self.cooldown.period.is_zero() {
            errors.push(ConfigError::ValidationError(
                "cooldown.period must be greater than zero".to_string(),
            ));
        }

        if self.provider.url.is_empty() {
            errors.push(ConfigError::ValidationError(
                "provider.url must not be empty".to_string(),
            ));
        }

        if self.notifiers.is_empty() {
            errors.push(ConfigError::ValidationError(
                "at least one notifier must be configured".to_string(),
            ));
        }
        for (name, notifier) in &self.notifiers {
            let url = match notifier {
                NotifierConfig::Chat(c) => &c.url,
                NotifierConfig::Webhook(w) => &w.url,
            };
            if url.is_empty() {
                errors.push(ConfigError::InvalidNotifier {
                    name: name.clone(),
                    message: "url must not be empty".to_string(),
                });
            }
        }

        if self.defaults.destinations.is_empty() {
            errors.push(ConfigError::ValidationError(
                "defaults.destinations must not be empty".to_string(),
            ));
        }
        for destination in &self.defaults.destinations {
            if !self.notifiers.contains_key(destination) {
                errors.push(ConfigError::ValidationError(format!(
                    "defaults.destinations references unknown notifier '{}'",
                    destination
                )));
            }
        }

        for user in &self.seed.users {
            if user.timezone.parse::<chrono_tz::Tz>().is_err() {
                errors.push(ConfigError::ValidationError(format!(
                    "seed user '{}' has unknown timezone '{}'",
                    user.id, user.timezone
                )));
            }
        }
        for configs in self.seed.alert_configs.values() {
            for alert_config in configs {
                if let Err(e) = validate_operator(&alert_config.id, &alert_config.condition.operator)
                {
                    errors.push(e);
                }
            }
        }
        for subscription in &self.seed.subscriptions {
            if let Err(e) = validate_time_of_day(&subscription.id, &subscription.time_of_day) {
                errors.push(e);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
