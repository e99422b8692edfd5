// src/lib.rs
//! Skysentry - environmental alerting and digest scheduling daemon.

pub mod alert;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod provider;
pub mod scheduler;
pub mod storage;
pub mod subscription;

// Re-export commonly used types
pub use alert::{
    Alert, AlertCondition, AlertFactory, AlertLevel, AlertType, CooldownTracker, alert_key,
    classify,
};
pub use cli::LogFormat;
pub use metrics::{MetricsServer, register_metric_descriptions};
pub use notify::{
    ChatNotifier, DEFAULT_QUEUE_CAPACITY, NotificationContent, NotificationJob, NotificationQueue,
    NotificationWorker, Notifier, NotifierRegistry, WebhookNotifier, backoff_delay,
};
pub use provider::{HttpWeatherProvider, StaticProvider, WeatherMetrics, WeatherProvider};
pub use scheduler::Scheduler;
pub use storage::{AlertConfig, Location, MemoryStorage, Storage, User};
pub use subscription::{Subscription, SubscriptionKind};
