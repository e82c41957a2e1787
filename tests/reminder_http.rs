use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::json;

use orbit_watch::predict::{next_passes, PassSearch};
use orbit_watch::scheduler::{ChannelNotifier, ReminderScheduler, ReminderStore};
use orbit_watch::tle::{ElementSet, ElementSource, HttpFetcher, TleCache};
use orbit_watch::tracker::GroundObserver;
use orbit_watch::web::auth::AppState;
use orbit_watch::web::{router, Config};

const USERS: &str = "users:\n  - key: \"k-alice\"\n    user_id: \"alice\"\n";

fn app_state(
    config: Config,
    store: Arc<ReminderStore>,
    notifier: ChannelNotifier,
    scheduler: &ReminderScheduler,
) -> AppState {
    let cache_path =
        std::env::temp_dir().join(format!("orbit-watch-tle-{}.txt", uuid::Uuid::new_v4()));
    let source = ElementSource::new(
        config.tle.source_settings(),
        TleCache::new(cache_path, config.tle.cache_expiration),
        HttpFetcher::new(Duration::from_secs(1)).unwrap(),
    );
    let observer = config.observer.observer().unwrap();
    AppState {
        config: Arc::new(config),
        source: Arc::new(source),
        store,
        notifier,
        scheduler: scheduler.monitor(),
        observer,
        pass_search: PassSearch::default(),
        http: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn predicted_rise_time_round_trips_through_reminder_api() {
    let start = Utc.with_ymd_and_hms(2024, 8, 29, 0, 0, 0).unwrap();
    let observer = GroundObserver::new(40.7128, -74.0060, 10.0).unwrap();
    let passes = next_passes(
        &ElementSet::fallback(),
        &observer,
        1,
        start,
        &PassSearch::default(),
    )
    .unwrap();
    let rise = passes[0].rise_time;
    let rise_json = serde_json::to_value(&passes[0]).unwrap()["rise_time"].clone();
    let rise_text = rise_json.as_str().unwrap().to_string();

    let config = Config::from_str(USERS).unwrap();
    let store = Arc::new(ReminderStore::in_memory().unwrap());
    let notifier = ChannelNotifier::new(16);
    let scheduler =
        ReminderScheduler::new(store.clone(), Arc::new(notifier.clone()), Duration::from_secs(60));
    let state = app_state(config, store.clone(), notifier.clone(), &scheduler);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/reminders", listener.local_addr().unwrap());
    let server = tokio::spawn(async move { axum::serve(listener, router(state)).await });

    let client = reqwest::Client::new();
    let body = json!({ "pass_time": rise_text });

    let anonymous = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(anonymous.status(), reqwest::StatusCode::UNAUTHORIZED);

    let created = client
        .post(&url)
        .bearer_auth("k-alice")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    let created: serde_json::Value = created.json().await.unwrap();
    assert_eq!(created["status"], "created");
    assert_eq!(created["pass_time"], rise_json);

    let duplicate = client
        .post(&url)
        .bearer_auth("k-alice")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), reqwest::StatusCode::OK);

    let listed: serde_json::Value = client
        .get(&url)
        .bearer_auth("k-alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["pass_time"], rise_json);

    let mut rx = notifier.subscribe();
    let report = scheduler.run_cycle(rise + ChronoDuration::seconds(30)).unwrap();
    assert_eq!(report.dispatched, 1);

    let notification = rx.try_recv().unwrap();
    assert_eq!(notification.pass_time, rise);
    assert_eq!(serde_json::to_value(&notification).unwrap()["pass_time"], rise_json);

    server.abort();
}

#[tokio::test]
async fn naive_pass_time_is_rejected() {
    let config = Config::from_str(USERS).unwrap();
    let store = Arc::new(ReminderStore::in_memory().unwrap());
    let notifier = ChannelNotifier::new(4);
    let scheduler =
        ReminderScheduler::new(store.clone(), Arc::new(notifier.clone()), Duration::from_secs(60));
    let state = app_state(config, store.clone(), notifier, &scheduler);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/reminders", listener.local_addr().unwrap());
    let server = tokio::spawn(async move { axum::serve(listener, router(state)).await });

    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth("k-alice")
        .json(&json!({ "pass_time": "2024-08-29T04:36:14" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(store.for_user("alice").unwrap().is_empty());

    server.abort();
}
