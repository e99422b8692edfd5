//! Notification queue and worker implementation.
//!
//! The queue decouples scheduler ticks from channel delivery: the
//! scheduler enqueues jobs without blocking, the worker fans each job
//! out to its destinations in parallel and records failures without
//! propagating them across user boundaries.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::{NotificationContent, NotificationJob, NotifierRegistry};
use crate::error::QueueError;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Notification queue using a broadcast channel with ring buffer.
///
/// The broadcast channel gives native drop-oldest behavior: when
/// capacity is reached, old jobs are overwritten and receivers observe
/// a `Lagged` error.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: broadcast::Sender<NotificationJob>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Enqueue a job (non-blocking).
    ///
    /// # Errors
    /// Returns [`QueueError::Closed`] when no worker is subscribed.
    pub fn send(&self, job: NotificationJob) -> Result<(), QueueError> {
        tracing::trace!(user_id = %job.user.id, kind = job.content.kind(), "Enqueueing notification");
        self.tx.send(job).map_err(|_| QueueError::Closed)?;
        metrics::gauge!("skysentry_queue_size").set(self.tx.len() as f64);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationJob> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.len() == 0
    }
}

/// Worker that consumes jobs and sends them via the registry.
pub struct NotificationWorker {
    rx: broadcast::Receiver<NotificationJob>,
    tx: broadcast::Sender<NotificationJob>,
    registry: Arc<NotifierRegistry>,
}

impl NotificationWorker {
    pub fn new(queue: &NotificationQueue, registry: Arc<NotifierRegistry>) -> Self {
        Self {
            rx: queue.subscribe(),
            tx: queue.tx.clone(),
            registry,
        }
    }

    /// Run the worker loop until cancelled or the queue closes.
    pub async fn run(&mut self, cancel: CancellationToken) {
        tracing::debug!("Notification worker started");

        loop {
            tokio::select! {
                result = self.rx.recv() => {
                    match result {
                        Ok(job) => {
                            self.process_job(job).await;
                            metrics::gauge!("skysentry_queue_size").set(self.tx.len() as f64);
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(dropped_count = n, "Queue full, dropping {} oldest jobs", n);
                            metrics::counter!("skysentry_notifications_dropped_total").increment(n);
                            metrics::gauge!("skysentry_queue_size").set(self.tx.len() as f64);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::debug!("Notification queue closed");
                            return;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("Notification worker shutting down gracefully");
                    return;
                }
            }
        }
    }

    /// Fan one job out to all of its destinations in parallel. Each
    /// destination's failure is independent.
    async fn process_job(&self, job: NotificationJob) {
        let span = tracing::info_span!(
            "process_notification",
            user_id = %job.user.id,
            kind = job.content.kind()
        );

        async {
            let futures: Vec<_> = job
                .destinations
                .iter()
                .filter_map(|dest| match self.registry.get(dest) {
                    Some(notifier) => Some(notifier),
                    None => {
                        // Startup validation should make this unreachable.
                        tracing::error!(notifier = %dest, "Notifier not found in registry");
                        metrics::counter!(
                            "skysentry_notify_errors_total",
                            "notifier" => dest.clone()
                        )
                        .increment(1);
                        None
                    }
                })
                .map(|notifier| {
                    let job = job.clone();
                    async move {
                        let result = match &job.content {
                            NotificationContent::Alert(alert) => {
                                notifier.send_alert(alert, &job.user).await
                            }
                            NotificationContent::Digest { metrics, location } => {
                                notifier.send_digest(metrics, location, &job.user).await
                            }
                        };
                        (notifier.name().to_string(), result)
                    }
                })
                .collect();

            for (notifier_name, result) in join_all(futures).await {
                match result {
                    Ok(()) => {
                        tracing::info!(
                            notifier = %notifier_name,
                            user_id = %job.user.id,
                            "Notification sent successfully"
                        );
                        metrics::counter!(
                            "skysentry_notifications_sent_total",
                            "notifier" => notifier_name,
                            "kind" => job.content.kind()
                        )
                        .increment(1);
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            notifier = %notifier_name,
                            user_id = %job.user.id,
                            "Failed to send notification after all retries"
                        );
                        metrics::counter!(
                            "skysentry_notify_errors_total",
                            "notifier" => notifier_name
                        )
                        .increment(1);
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for NotificationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationWorker").finish()
    }
}

/// Calculate exponential backoff delay: `min(base * 2^attempt, max)`.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let delay = base.saturating_mul(2_u32.saturating_pow(attempt));
    std::cmp::min(delay, max)
}
