//! Queue payload types.

use crate::alert::Alert;
use crate::provider::WeatherMetrics;
use crate::storage::User;

/// What a notification job delivers.
#[derive(Debug, Clone)]
pub enum NotificationContent {
    /// A triggered threshold alert.
    Alert(Alert),
    /// A scheduled weather summary for the user's location.
    Digest {
        metrics: WeatherMetrics,
        location: String,
    },
}

impl NotificationContent {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationContent::Alert(_) => "alert",
            NotificationContent::Digest { .. } => "digest",
        }
    }
}

/// A job ready for the notification worker.
///
/// Must implement `Clone` as required by `broadcast::Sender`.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub user: User,
    pub content: NotificationContent,
    /// Notifier names to fan out to; validated non-empty at startup.
    pub destinations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertFactory, AlertType};

    #[test]
    fn content_kind_labels() {
        let factory = AlertFactory::new();
        let alert = factory.build(AlertType::Temperature, 35.0, 25.0, "Oslo");
        assert_eq!(NotificationContent::Alert(alert).kind(), "alert");

        let digest = NotificationContent::Digest {
            metrics: WeatherMetrics {
                temperature: 20.0,
                humidity: 50.0,
                pressure: 1013.0,
                wind_speed: 5.0,
                uv_index: 2.0,
                aqi: 30.0,
                visibility: 10.0,
            },
            location: "Oslo".to_string(),
        };
        assert_eq!(digest.kind(), "digest");
    }
}
