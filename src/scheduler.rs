//! Periodic evaluation loop driving the alert and digest phases.
//!
//! One tick source drives both phases sequentially; the next tick
//! waits for the current one to finish so overlapping scans cannot
//! double-send. Per-user work inside the alert phase fans out across a
//! bounded set of tasks. Every collaborator failure is logged, counted
//! and skipped for that user in that tick; nothing here aborts the
//! loop.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::alert::{AlertFactory, CooldownTracker, alert_key};
use crate::config::SchedulerConfig;
use crate::notify::{NotificationContent, NotificationJob, NotificationQueue};
use crate::provider::{WeatherMetrics, WeatherProvider};
use crate::storage::{Location, Storage, User};

/// Convert a UTC tick instant to a user's local wall-clock time.
///
/// An invalid timezone identifier falls back to UTC rather than
/// failing the scan.
fn user_local_time(instant: DateTime<Utc>, timezone: &str) -> DateTime<Tz> {
    match timezone.parse::<Tz>() {
        Ok(tz) => instant.with_timezone(&tz),
        Err(_) => {
            tracing::warn!(timezone = %timezone, "Invalid timezone, falling back to UTC");
            instant.with_timezone(&chrono_tz::UTC)
        }
    }
}

/// The evaluation engine: ticks, evaluates, enqueues.
#[derive(Clone)]
pub struct Scheduler {
    storage: Arc<dyn Storage>,
    provider: Arc<dyn WeatherProvider>,
    queue: NotificationQueue,
    cooldown: Arc<CooldownTracker>,
    factory: Arc<AlertFactory>,
    config: SchedulerConfig,
    destinations: Vec<String>,
}

impl Scheduler {
    pub fn new(
        storage: Arc<dyn Storage>,
        provider: Arc<dyn WeatherProvider>,
        queue: NotificationQueue,
        cooldown: Arc<CooldownTracker>,
        config: SchedulerConfig,
        destinations: Vec<String>,
    ) -> Self {
        Self {
            storage,
            provider,
            queue,
            cooldown,
            factory: Arc::new(AlertFactory::new()),
            config,
            destinations,
        }
    }

    /// Run the tick loop until the token is cancelled.
    ///
    /// A tick runs to completion before the next one is scheduled;
    /// cancellation is observed at the top of each tick and at every
    /// per-user boundary inside a tick.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            tick_interval_secs = self.config.tick_interval.as_secs(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler shutting down");
                    return;
                }
                _ = interval.tick() => {
                    self.run_tick(Utc::now(), &cancel).await;
                }
            }
        }
    }

    /// One full tick: alert phase, then digest phase.
    pub async fn run_tick(&self, tick_time: DateTime<Utc>, cancel: &CancellationToken) {
        let span = tracing::info_span!("tick", tick_time = %tick_time);

        async {
            metrics::counter!("skysentry_ticks_total").increment(1);

            let users = match self.storage.active_users_with_location().await {
                Ok(users) => users,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load users, skipping tick");
                    metrics::counter!("skysentry_storage_errors_total").increment(1);
                    return;
                }
            };
            tracing::debug!(user_count = users.len(), "Tick started");

            self.run_alert_phase(&users, cancel).await;
            if cancel.is_cancelled() {
                return;
            }
            self.run_digest_phase(&users, tick_time, cancel).await;
        }
        .instrument(span)
        .await
    }

    /// Evaluate every active alert config of every user, fanning users
    /// out across at most `max_concurrent_users` tasks.
    async fn run_alert_phase(&self, users: &[User], cancel: &CancellationToken) {
        let mut tasks: JoinSet<()> = JoinSet::new();

        for user in users {
            if cancel.is_cancelled() {
                tracing::debug!("Stop requested, not starting further alert evaluations");
                break;
            }
            while tasks.len() >= self.config.max_concurrent_users {
                if let Some(Err(e)) = tasks.join_next().await {
                    tracing::error!(error = %e, "Alert evaluation task panicked");
                }
            }

            let scheduler = self.clone();
            let user = user.clone();
            tasks.spawn(async move { scheduler.process_user_alerts(user).await });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Alert evaluation task panicked");
            }
        }
    }

    /// Alert phase for a single user: fetch one sample, run every
    /// active config through evaluation, cooldown and dispatch.
    async fn process_user_alerts(&self, user: User) {
        let span = tracing::debug_span!("user_alerts", user_id = %user.id);

        async {
            let Some(location) = user.location.clone() else {
                return;
            };

            let configs = match self.storage.active_alert_configs_for(&user.id).await {
                Ok(configs) => configs,
                Err(e) => {
                    tracing::error!(error = %e, user_id = %user.id, "Failed to load alert configs");
                    metrics::counter!("skysentry_storage_errors_total").increment(1);
                    return;
                }
            };
            if configs.is_empty() {
                return;
            }

            let Some(sample) = self.fetch_metrics(&location).await else {
                return;
            };

            for config in &configs {
                let value = sample.value_for(config.alert_type);
                if !config.condition.evaluate(value) {
                    continue;
                }

                let key = alert_key(&user.id, config.alert_type, &location.name);
                if !self.cooldown.try_trigger(&key) {
                    tracing::debug!(key = %key, "Alert suppressed by cooldown");
                    metrics::counter!("skysentry_alerts_suppressed_total").increment(1);
                    continue;
                }

                let alert =
                    self.factory
                        .build(config.alert_type, value, config.condition.value, &location.name);
                tracing::info!(
                    alert_id = %alert.id,
                    user_id = %user.id,
                    alert_type = %alert.alert_type,
                    level = %alert.level,
                    measured_value = value,
                    "Alert triggered"
                );
                metrics::counter!(
                    "skysentry_alerts_triggered_total",
                    "level" => alert.level.to_string()
                )
                .increment(1);

                self.dispatch(NotificationJob {
                    user: user.clone(),
                    content: NotificationContent::Alert(alert),
                    destinations: self.destinations.clone(),
                });
            }
        }
        .instrument(span)
        .await
    }

    /// Evaluate every active subscription against the tick instant in
    /// the subscriber's local time.
    async fn run_digest_phase(
        &self,
        users: &[User],
        tick_time: DateTime<Utc>,
        cancel: &CancellationToken,
    ) {
        let subscriptions = match self.storage.active_subscriptions().await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load subscriptions, skipping digest phase");
                metrics::counter!("skysentry_storage_errors_total").increment(1);
                return;
            }
        };
        if subscriptions.is_empty() {
            return;
        }

        let users_by_id: HashMap<&str, &User> =
            users.iter().map(|u| (u.id.as_str(), u)).collect();

        for subscription in &subscriptions {
            if cancel.is_cancelled() {
                tracing::debug!("Stop requested, not starting further digest evaluations");
                return;
            }

            // Users without a location never made it into the scan set.
            let Some(user) = users_by_id.get(subscription.user_id.as_str()) else {
                continue;
            };
            let Some(location) = user.location.clone() else {
                continue;
            };

            let local_now = user_local_time(tick_time, &user.timezone);
            if !subscription.is_due(&local_now) {
                continue;
            }

            tracing::info!(
                subscription_id = %subscription.id,
                user_id = %user.id,
                local_time = %local_now,
                "Digest due"
            );

            let Some(sample) = self.fetch_metrics(&location).await else {
                continue;
            };

            metrics::counter!("skysentry_digests_enqueued_total").increment(1);
            self.dispatch(NotificationJob {
                user: (*user).clone(),
                content: NotificationContent::Digest {
                    metrics: sample,
                    location: location.name.clone(),
                },
                destinations: self.destinations.clone(),
            });
        }
    }

    /// Fetch a sample under the configured timeout. Failures and
    /// timeouts are counted and reported as `None`.
    async fn fetch_metrics(&self, location: &Location) -> Option<WeatherMetrics> {
        let fetch = self.provider.current_metrics(location.lat, location.lon);
        match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Ok(Ok(sample)) => Some(sample),
            Ok(Err(e)) => {
                tracing::error!(error = %e, location = %location.name, "Weather fetch failed");
                metrics::counter!("skysentry_fetch_errors_total").increment(1);
                None
            }
            Err(_) => {
                tracing::error!(
                    location = %location.name,
                    timeout_secs = self.config.fetch_timeout.as_secs(),
                    "Weather fetch timed out"
                );
                metrics::counter!("skysentry_fetch_errors_total").increment(1);
                None
            }
        }
    }

    fn dispatch(&self, job: NotificationJob) {
        if let Err(e) = self.queue.send(job) {
            tracing::error!(error = %e, "Failed to enqueue notification");
            metrics::counter!("skysentry_queue_errors_total").increment(1);
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("destinations", &self.destinations)
            .finish()
    }
}
