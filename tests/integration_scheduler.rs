//! End-to-end scheduler tests: weather endpoint to delivered message.
//!
//! Uses wiremock both as the weather provider and as the notification
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use skysentry::alert::{AlertCondition, CooldownTracker};
use skysentry::config::SchedulerConfig;
use skysentry::notify::{ChatNotifier, NotificationQueue, NotificationWorker, NotifierRegistry};
use skysentry::provider::HttpWeatherProvider;
use skysentry::storage::{AlertConfig, Location, MemoryStorage, User};
use skysentry::subscription::{Subscription, SubscriptionKind};
use skysentry::{AlertType, Scheduler};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create client")
}

fn delhi() -> Location {
    Location {
        name: "Delhi".to_string(),
        lat: 28.61,
        lon: 77.21,
    }
}

fn weather_body(aqi: f64) -> serde_json::Value {
    serde_json::json!({
        "temperature": 31.0,
        "humidity": 40.0,
        "pressure": 1005.0,
        "wind_speed": 8.0,
        "uv_index": 6.0,
        "aqi": aqi,
        "visibility": 4.0
    })
}

/// Full pipeline: breached AQI threshold ends up as a chat message
/// containing the health guidance line, and the cooldown suppresses
/// the identical breach on the next tick.
#[tokio::test]
async fn aqi_breach_reaches_chat_once_per_cooldown_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current"))
        .and(query_param("lat", "28.61"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(220.0)))
        .mount(&mock_server)
        .await;

    // AQI 220 against threshold 100 is a High alert with the
    // unhealthy-air guidance appended.
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_string_contains("[HIGH] Air Quality Alert - High"))
        .and(body_string_contains("unhealthy"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client();
    let storage = Arc::new(MemoryStorage::new());
    storage.add_user(User {
        id: "u1".to_string(),
        timezone: "Asia/Kolkata".to_string(),
        location: Some(delhi()),
    });
    storage.add_alert_config(
        "u1",
        AlertConfig {
            id: "c1".to_string(),
            alert_type: AlertType::AirQuality,
            condition: AlertCondition::new(">", 100.0),
            active: true,
        },
    );

    let provider = Arc::new(HttpWeatherProvider::new(
        client.clone(),
        format!("{}/current", mock_server.uri()),
    ));

    let mut registry = NotifierRegistry::new();
    registry
        .register(Arc::new(ChatNotifier::new(
            "chat".to_string(),
            format!("{}/send", mock_server.uri()),
            client,
        )))
        .unwrap();

    let queue = NotificationQueue::new(16);
    let mut worker = NotificationWorker::new(&queue, Arc::new(registry));

    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let worker_handle = tokio::spawn(async move { worker.run(worker_cancel).await });

    let scheduler = Scheduler::new(
        storage,
        provider,
        queue,
        Arc::new(CooldownTracker::new()),
        SchedulerConfig::default(),
        vec!["chat".to_string()],
    );

    let tick = Utc.with_ymd_and_hms(2026, 1, 12, 12, 0, 0).unwrap();
    scheduler.run_tick(tick, &cancel).await;
    // Second tick: same breach, still inside the one-hour cooldown.
    scheduler.run_tick(tick, &cancel).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();
    worker_handle.await.expect("worker should stop cleanly");
}

/// Digest subscriptions fire when the tick lands inside the match
/// window in the subscriber's local time, and the digest text reaches
/// the chat endpoint.
#[tokio::test]
async fn daily_digest_is_delivered_in_local_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(50.0)))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_string_contains("Weather digest for Delhi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = make_client();
    let storage = Arc::new(MemoryStorage::new());
    storage.add_user(User {
        id: "u1".to_string(),
        timezone: "Asia/Kolkata".to_string(),
        location: Some(delhi()),
    });
    storage.add_subscription(Subscription {
        id: "s1".to_string(),
        user_id: "u1".to_string(),
        kind: SubscriptionKind::Daily,
        time_of_day: "08:00".to_string(),
        active: true,
    });

    let provider = Arc::new(HttpWeatherProvider::new(
        client.clone(),
        format!("{}/current", mock_server.uri()),
    ));

    let mut registry = NotifierRegistry::new();
    registry
        .register(Arc::new(ChatNotifier::new(
            "chat".to_string(),
            format!("{}/send", mock_server.uri()),
            client,
        )))
        .unwrap();

    let queue = NotificationQueue::new(16);
    let mut worker = NotificationWorker::new(&queue, Arc::new(registry));

    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let worker_handle = tokio::spawn(async move { worker.run(worker_cancel).await });

    let scheduler = Scheduler::new(
        storage,
        provider,
        queue,
        Arc::new(CooldownTracker::new()),
        SchedulerConfig::default(),
        vec!["chat".to_string()],
    );

    // 02:32 UTC is 08:02 in Asia/Kolkata (UTC+05:30).
    let tick = Utc.with_ymd_and_hms(2026, 1, 15, 2, 32, 0).unwrap();
    scheduler.run_tick(tick, &cancel).await;

    // One minute before the target time: forward-only window, no send.
    let early = Utc.with_ymd_and_hms(2026, 1, 16, 2, 29, 0).unwrap();
    scheduler.run_tick(early, &cancel).await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();
    worker_handle.await.expect("worker should stop cleanly");
}

/// A weather endpoint that answers with garbage must not produce any
/// notification, only a skipped user.
#[tokio::test]
async fn malformed_weather_response_produces_no_notification() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    // No POST expectation mounted: any send would 404 and the mock
    // server would report the unexpected request on drop.
    let client = make_client();
    let storage = Arc::new(MemoryStorage::new());
    storage.add_user(User {
        id: "u1".to_string(),
        timezone: "UTC".to_string(),
        location: Some(delhi()),
    });
    storage.add_alert_config(
        "u1",
        AlertConfig {
            id: "c1".to_string(),
            alert_type: AlertType::AirQuality,
            condition: AlertCondition::new(">", 100.0),
            active: true,
        },
    );

    let provider = Arc::new(HttpWeatherProvider::new(
        client,
        format!("{}/current", mock_server.uri()),
    ));

    let queue = NotificationQueue::new(16);
    let mut rx = queue.subscribe();

    let scheduler = Scheduler::new(
        storage,
        provider,
        queue,
        Arc::new(CooldownTracker::new()),
        SchedulerConfig::default(),
        vec!["chat".to_string()],
    );

    scheduler
        .run_tick(Utc::now(), &CancellationToken::new())
        .await;
    assert!(rx.try_recv().is_err(), "no job should be enqueued");
}
