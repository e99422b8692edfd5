//! Notification channels: queue, worker, registry and channel
//! implementations.
//!
//! All channels are best-effort with bounded retry: 5xx and network
//! errors retry with exponential backoff, 4xx errors fail immediately,
//! and an exhausted send is reported to the worker, never propagated
//! into the scheduler.

pub mod chat;
pub mod payload;
pub mod queue;
pub mod registry;
pub mod traits;
pub mod webhook;

pub use chat::ChatNotifier;
pub use payload::{NotificationContent, NotificationJob};
pub use queue::{DEFAULT_QUEUE_CAPACITY, NotificationQueue, NotificationWorker, backoff_delay};
pub use registry::NotifierRegistry;
pub use traits::Notifier;
pub use webhook::WebhookNotifier;

use std::time::Duration;

use serde::Serialize;

use crate::error::NotifyError;

/// Backoff base delay for channel retries.
const CHANNEL_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Maximum backoff delay for channel retries.
const CHANNEL_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Maximum number of send attempts per channel.
const CHANNEL_MAX_RETRIES: u32 = 3;

/// POST a JSON body with the shared retry policy.
///
/// 4xx responses fail immediately (the payload will not get better);
/// 5xx responses and transport errors retry with exponential backoff
/// up to [`CHANNEL_MAX_RETRIES`] attempts.
pub(crate) async fn post_json_with_retry<T: Serialize>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
) -> Result<(), NotifyError> {
    for attempt in 0..CHANNEL_MAX_RETRIES {
        match client.post(url).json(body).send().await {
            Ok(response) if response.status().is_success() => {
                return Ok(());
            }
            Ok(response) if response.status().is_client_error() => {
                let status = response.status();
                tracing::error!(status = %status, "Channel returned client error, not retrying");
                return Err(NotifyError::SendFailed(format!("client error: {}", status)));
            }
            Ok(response) => {
                tracing::warn!(
                    attempt = attempt,
                    status = %response.status(),
                    "Channel returned server error, retrying"
                );
            }
            Err(e) => {
                tracing::warn!(attempt = attempt, error = %e, "Channel send failed, retrying");
            }
        }

        if attempt < CHANNEL_MAX_RETRIES - 1 {
            let delay = backoff_delay(attempt, CHANNEL_BACKOFF_BASE, CHANNEL_BACKOFF_MAX);
            tracing::debug!(delay_ms = delay.as_millis(), "Waiting before retry");
            tokio::time::sleep(delay).await;
        }
    }

    Err(NotifyError::MaxRetriesExceeded)
}
