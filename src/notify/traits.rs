//! Notifier trait definition.

use async_trait::async_trait;

use crate::alert::Alert;
use crate::error::NotifyError;
use crate::provider::WeatherMetrics;
use crate::storage::User;

/// Abstract notification channel.
///
/// Implementations must be `Send + Sync` to work across async tasks
/// and manage their own retry/backoff internally. Both operations are
/// best-effort: a returned error means the send is given up for this
/// tick, nothing more.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Unique name of this notifier instance (e.g. "ops-webhook").
    fn name(&self) -> &str;

    /// Channel type (e.g. "chat", "webhook").
    fn notifier_type(&self) -> &str;

    /// Deliver a triggered alert to the user.
    async fn send_alert(&self, alert: &Alert, user: &User) -> Result<(), NotifyError>;

    /// Deliver a weather digest to the user.
    async fn send_digest(
        &self,
        metrics: &WeatherMetrics,
        location: &str,
        user: &User,
    ) -> Result<(), NotifyError>;
}

impl std::fmt::Debug for dyn Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("name", &self.name())
            .field("type", &self.notifier_type())
            .finish()
    }
}
