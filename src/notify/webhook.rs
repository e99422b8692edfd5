//! Webhook-style channel implementation.
//!
//! Sends structured, color-coded attachment payloads to an incoming
//! webhook endpoint. Alerts carry the severity color; digests use a
//! neutral text message.

use async_trait::async_trait;
use serde::Serialize;
use tracing::Instrument;

use crate::alert::{Alert, ChannelAttachment, channel_attachment, format_digest_text};
use crate::error::NotifyError;
use crate::provider::WeatherMetrics;
use crate::storage::User;

use super::{Notifier, post_json_with_retry};

/// Webhook message body: either a plain text or a list of attachments.
#[derive(Debug, Clone, Serialize)]
struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ChannelAttachment>,
}

fn build_alert_message(alert: &Alert, user: &User) -> WebhookMessage {
    WebhookMessage {
        text: None,
        attachments: vec![channel_attachment(alert, &user.timezone)],
    }
}

fn build_digest_message(metrics: &WeatherMetrics, location: &str, user: &User) -> WebhookMessage {
    WebhookMessage {
        text: Some(format_digest_text(metrics, location, &user.timezone)),
        attachments: Vec::new(),
    }
}

/// Webhook channel notifier.
pub struct WebhookNotifier {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(name: String, url: String, client: reqwest::Client) -> Self {
        Self { name, url, client }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn notifier_type(&self) -> &str {
        "webhook"
    }

    async fn send_alert(&self, alert: &Alert, user: &User) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "send_webhook_alert",
            alert_id = %alert.id,
            user_id = %user.id,
            notifier_name = %self.name
        );

        let message = build_alert_message(alert, user);
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
            "send_webhook_digest",
            user_id = %user.id,
            notifier_name = %self.name
        );

        let message = build_digest_message(metrics, location, user);
        post_json_with_retry(&self.client, &self.url, &message)
            .instrument(span)
            .await
    }
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("name", &self.name)
            .finish()
    }
}
