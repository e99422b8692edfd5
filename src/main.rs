//! Skysentry - environmental alerting and digest scheduling daemon.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use skysentry::alert::CooldownTracker;
use skysentry::cli::{Cli, LogFormat};
use skysentry::config::Config;
use skysentry::provider::HttpWeatherProvider;
use skysentry::storage::MemoryStorage;
use skysentry::{
    DEFAULT_QUEUE_CAPACITY, MetricsServer, NotificationQueue, NotificationWorker,
    NotifierRegistry, Scheduler,
};

/// Initialize the tracing subscriber with the specified log format.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);

    info!(config_path = %cli.config.display(), "Loading configuration");

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "Failed to load configuration");
            std::process::exit(1);
        }
    };

    info!("Validating configuration");
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Configuration validation error");
        }
        error!(
            error_count = errors.len(),
            "Configuration validation failed"
        );
        std::process::exit(1);
    }

    // Validate mode: display a summary and exit
    if cli.validate {
        println!("Configuration is valid: {}", cli.config.display());
        println!("  Provider URL: {}", config.provider.url);
        println!("  Notifiers: {}", config.notifiers.len());
        println!(
            "  Default destinations: {}",
            config.defaults.destinations.join(", ")
        );
        println!(
            "  Seed: {} users, {} subscriptions",
            config.seed.users.len(),
            config.seed.subscriptions.len()
        );
        println!(
            "  Metrics: {} (port {})",
            if config.metrics.enabled {
                "enabled"
            } else {
                "disabled"
            },
            config.metrics.port
        );
        return Ok(());
    }

    info!(config_path = %cli.config.display(), "skysentry starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

/// Main async entry point.
async fn run(config: Config) -> Result<()> {
    // Shared HTTP client; the timeout bounds every dispatch call.
    let http_client = reqwest::Client::builder()
        .timeout(config.scheduler.dispatch_timeout)
        .build()?;

    let registry = match NotifierRegistry::from_config(&config.notifiers, http_client.clone()) {
        Ok(registry) => Arc::new(registry),
        Err(errors) => {
            for e in &errors {
                error!(error = %e, "Notifier setup error");
            }
            anyhow::bail!("failed to set up notifiers ({} errors)", errors.len());
        }
    };

    let queue = NotificationQueue::new(DEFAULT_QUEUE_CAPACITY);
    let mut worker = NotificationWorker::new(&queue, Arc::clone(&registry));

    let cancel = CancellationToken::new();

    // Start metrics server if enabled
    let metrics_handle = if config.metrics.enabled {
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let server = MetricsServer::with_ready_signal(config.metrics.port, ready_tx);
        let cancel_metrics = cancel.clone();
        info!(port = config.metrics.port, "Starting metrics server");
        let handle = tokio::spawn(async move {
            if let Err(e) = server.run(cancel_metrics).await {
                error!(error = %e, "Metrics server error");
            }
        });
        if ready_rx.await.is_ok() {
            let names: Vec<&str> = config.notifiers.keys().map(|s| s.as_str()).collect();
            skysentry::metrics::initialize_metrics(&names);
        }
        Some(handle)
    } else {
        info!("Metrics server disabled");
        None
    };

    // Storage backed by the seed data set
    let storage = Arc::new(MemoryStorage::new());
    for user in &config.seed.users {
        storage.add_user(user.clone());
    }
    for (user_id, configs) in &config.seed.alert_configs {
        for alert_config in configs {
            storage.add_alert_config(user_id, alert_config.clone());
        }
    }
    for subscription in &config.seed.subscriptions {
        storage.add_subscription(subscription.clone());
    }
    info!(
        user_count = config.seed.users.len(),
        subscription_count = config.seed.subscriptions.len(),
        "Storage seeded"
    );

    let provider = Arc::new(HttpWeatherProvider::new(
        http_client,
        config.provider.url.clone(),
    ));
    let cooldown = Arc::new(CooldownTracker::with_period(config.cooldown.period));

    let scheduler = Scheduler::new(
        storage,
        provider,
        queue.clone(),
        cooldown,
        config.scheduler.clone(),
        config.defaults.destinations.clone(),
    );

    // Signal handler for graceful shutdown
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c signal");
            return;
        }
        info!("Received shutdown signal, initiating graceful shutdown");
        cancel_clone.cancel();
    });

    let worker_cancel = cancel.clone();
    let worker_handle = tokio::spawn(async move {
        worker.run(worker_cancel).await;
    });

    // Run the scheduler until cancelled
    scheduler.run(cancel.clone()).await;

    info!("Waiting for notification worker to drain queue...");
    let _ = tokio::time::timeout(Duration::from_secs(5), worker_handle).await;

    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }

    info!("skysentry shutdown complete");
    Ok(())
}
