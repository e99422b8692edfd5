//! Prometheus metrics exposition server.
//!
//! Exposes skysentry counters and gauges in Prometheus format on a
//! configurable port.

use std::net::SocketAddr;
use std::sync::OnceLock;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Global flag to track if recorder is installed (for tests)
static RECORDER_INSTALLED: OnceLock<()> = OnceLock::new();

/// Register all metric descriptions for Prometheus.
///
/// Called once at startup after the recorder is installed; the
/// descriptions become HELP text in the exposition output.
pub fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        "skysentry_ticks_total",
        "Total number of scheduler ticks executed"
    );
    describe_counter!(
        "skysentry_alerts_triggered_total",
        "Total number of alerts that passed evaluation and cooldown"
    );
    describe_counter!(
        "skysentry_alerts_suppressed_total",
        "Total number of alerts blocked by the cooldown window"
    );
    describe_counter!(
        "skysentry_digests_enqueued_total",
        "Total number of digest notifications enqueued"
    );
    describe_counter!(
        "skysentry_fetch_errors_total",
        "Total number of weather fetch failures and timeouts"
    );
    describe_counter!(
        "skysentry_storage_errors_total",
        "Total number of storage read failures"
    );
    describe_counter!(
        "skysentry_queue_errors_total",
        "Total number of failed notification enqueues"
    );
    describe_counter!(
        "skysentry_notifications_sent_total",
        "Total number of notifications delivered per notifier and kind"
    );
    describe_counter!(
        "skysentry_notifications_dropped_total",
        "Total number of notifications dropped due to a full queue"
    );
    describe_counter!(
        "skysentry_notify_errors_total",
        "Total number of notification errors after retries exhausted"
    );

    describe_gauge!(
        "skysentry_queue_size",
        "Current number of jobs in the notification queue"
    );
    describe_gauge!(
        "skysentry_build_info",
        "Build information with version label (always 1)"
    );
}

/// Initialize all known metrics to their default values.
///
/// Called right after the recorder is installed so every series is
/// visible in `/metrics` from startup, before any events occur.
pub fn initialize_metrics(notifier_names: &[&str]) {
    use metrics::{counter, gauge};

    gauge!("skysentry_build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    gauge!("skysentry_queue_size").set(0.0);

    counter!("skysentry_ticks_total").absolute(0);
    counter!("skysentry_alerts_suppressed_total").absolute(0);
    counter!("skysentry_digests_enqueued_total").absolute(0);
    counter!("skysentry_fetch_errors_total").absolute(0);
    counter!("skysentry_storage_errors_total").absolute(0);
    counter!("skysentry_queue_errors_total").absolute(0);
    counter!("skysentry_notifications_dropped_total").absolute(0);

    for level in ["Low", "Medium", "High", "Critical"] {
        counter!("skysentry_alerts_triggered_total", "level" => level).absolute(0);
    }

    for notifier_name in notifier_names {
        counter!("skysentry_notify_errors_total", "notifier" => notifier_name.to_string())
            .absolute(0);
        for kind in ["alert", "digest"] {
            counter!(
                "skysentry_notifications_sent_total",
                "notifier" => notifier_name.to_string(),
                "kind" => kind
            )
            .absolute(0);
        }
    }

    tracing::info!(
        notifier_count = notifier_names.len(),
        "Metrics initialized to zero"
    );
}

/// Metrics server for Prometheus exposition.
///
/// Serves metrics on `/metrics` until cancelled.
pub struct MetricsServer {
    port: u16,
    /// Optional channel signalled once the recorder is installed, so
    /// callers can avoid emitting metrics that would be lost.
    ready_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MetricsServer {
    /// Create a new metrics server bound to the given port.
    ///
    /// Use port 0 to let the OS assign an available port.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ready_tx: None,
        }
    }

    /// Create a new metrics server with a ready signal channel.
    pub fn with_ready_signal(port: u16, ready_tx: tokio::sync::oneshot::Sender<()>) -> Self {
        Self {
            port,
            ready_tx: Some(ready_tx),
        }
    }

    /// Returns the configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Install the global recorder and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the exporter fails to install, including
    /// when a recorder is already installed in this process.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();

        let builder = PrometheusBuilder::new();
        builder
            .with_http_listener(addr)
            .install()
            .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

        let _ = RECORDER_INSTALLED.set(());

        register_metric_descriptions();

        if let Some(tx) = self.ready_tx {
            let _ = tx.send(());
        }

        info!(port = self.port, "Metrics server started on /metrics");

        cancel.cancelled().await;

        info!("Metrics server shutting down");

        Ok(())
    }
}

/// Check if the metrics recorder has been installed.
pub fn is_recorder_installed() -> bool {
    RECORDER_INSTALLED.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_reports_configured_port() {
        let server = MetricsServer::new(9090);
        assert_eq!(server.port(), 9090);
    }

    #[test]
    fn ready_signal_is_held_until_run() {
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        let _server = MetricsServer::with_ready_signal(0, tx);
        // Not signalled before run installs the recorder.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn description_registration_is_safe_without_recorder() {
        // With no recorder installed these calls are no-ops.
        register_metric_descriptions();
        initialize_metrics(&["chat"]);
    }
}
