//! Storage collaborator: users, alert configs and subscriptions.
//!
//! The scheduler reads everything through the [`Storage`] trait; the
//! persistence layer behind it is out of scope here. [`MemoryStorage`]
//! backs tests and dry runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alert::{AlertCondition, AlertType};
use crate::error::StorageError;
use crate::subscription::Subscription;

/// A geographic location a user monitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// A user as this core sees it: read-only, with a timezone and at
/// most one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// IANA timezone identifier; invalid values fall back to UTC at
    /// render time.
    pub timezone: String,
    pub location: Option<Location>,
}

/// A per-user threshold alert configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub id: String,
    pub alert_type: AlertType,
    pub condition: AlertCondition,
    pub active: bool,
}

/// Read interface the scheduler consumes.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Active users that have a configured location.
    async fn active_users_with_location(&self) -> Result<Vec<User>, StorageError>;

    /// Active alert configs belonging to a user.
    async fn active_alert_configs_for(&self, user_id: &str)
    -> Result<Vec<AlertConfig>, StorageError>;

    /// All active subscriptions across users.
    async fn active_subscriptions(&self) -> Result<Vec<Subscription>, StorageError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    users: Vec<User>,
    configs: HashMap<String, Vec<AlertConfig>>,
    subscriptions: Vec<Subscription>,
}

/// In-memory storage for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.inner.write().expect("storage lock").users.push(user);
    }

    pub fn add_alert_config(&self, user_id: &str, config: AlertConfig) {
        self.inner
            .write()
            .expect("storage lock")
            .configs
            .entry(user_id.to_string())
            .or_default()
            .push(config);
    }

    pub fn add_subscription(&self, subscription: Subscription) {
        self.inner
            .write()
            .expect("storage lock")
            .subscriptions
            .push(subscription);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn active_users_with_location(&self) -> Result<Vec<User>, StorageError> {
        let inner = self.inner.read().expect("storage lock");
        Ok(inner
            .users
            .iter()
            .filter(|u| u.location.is_some())
            .cloned()
            .collect())
    }

    async fn active_alert_configs_for(
        &self,
        user_id: &str,
    ) -> Result<Vec<AlertConfig>, StorageError> {
        let inner = self.inner.read().expect("storage lock");
        Ok(inner
            .configs
            .get(user_id)
            .map(|configs| configs.iter().filter(|c| c.active).cloned().collect())
            .unwrap_or_default())
    }

    async fn active_subscriptions(&self) -> Result<Vec<Subscription>, StorageError> {
        let inner = self.inner.read().expect("storage lock");
        Ok(inner
            .subscriptions
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect())
    }
}
