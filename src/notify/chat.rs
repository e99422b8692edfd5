//! Direct chat channel implementation.
//!
//! Delivers the plain-text alert and digest blocks straight to the
//! user through a chat bot endpoint. The recipient is addressed by
//! user id; the endpoint owns the mapping to an actual chat session.

use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;

use crate::alert::{Alert, format_alert_text, format_digest_text};
use crate::error::NotifyError;
use crate::provider::WeatherMetrics;
use crate::storage::User;

use super::{Notifier, post_json_with_retry};

/// Chat delivery body.
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    recipient: String,
    text: String,
}

/// Direct chat notifier.
pub struct ChatNotifier {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl ChatNotifier {
    pub fn new(name: String, url: String, client: reqwest::Client) -> Self {
        Self { name, url, client }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn notifier_type(&self) -> &str {
        "chat"
    }

    async fn send_alert(&self, alert: &Alert, user: &User) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "send_chat_alert",
            alert_id = %alert.id,
            user_id = %user.id,
            notifier_name = %self.name
        );

        let message = ChatMessage {
            recipient: user.id.clone(),
            text: format_alert_text(alert, &user.timezone),
        };
        post_json_with_retry(&self.client, &self.url, &message)
            .instrument(span)
            .await
    }

    async fn send_digest(
        &self,
        metrics: &WeatherMetrics,
        location: &str,
        user: &User,
    ) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "send_chat_digest",
            user_id = %user.id,
            notifier_name = %self.name
        );

        let message = ChatMessage {
            recipient: user.id.clone(),
            text: format_digest_text(metrics, location, &user.timezone),
        };
        post_json_with_retry(&self.client, &self.url, &message)
            .instrument(span)
            .await
    }
}

impl std::fmt::Debug for ChatNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatNotifier")
            .field("name", &self.name)
            .finish()
    }
}
