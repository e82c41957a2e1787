use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use tokio::sync::broadcast::error::TryRecvError;

use orbit_watch::predict::{next_passes, PassSearch};
use orbit_watch::scheduler::{ChannelNotifier, ReminderScheduler, ReminderStore};
use orbit_watch::tle::ElementSet;
use orbit_watch::tracker::GroundObserver;

#[test]
fn predicted_pass_reminder_is_published_once() {
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

    let store = Arc::new(ReminderStore::in_memory().unwrap());
    assert!(store.add("alice", rise).unwrap());
    assert!(!store.add("alice", rise).unwrap());

    let notifier = ChannelNotifier::new(16);
    let mut rx = notifier.subscribe();
    let scheduler =
        ReminderScheduler::new(store.clone(), Arc::new(notifier), Duration::from_secs(60));

    assert_eq!(scheduler.run_cycle(rise - ChronoDuration::seconds(1)).unwrap().due, 0);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    let report = scheduler.run_cycle(rise + ChronoDuration::seconds(30)).unwrap();
    assert_eq!(report.dispatched, 1);

    let notification = rx.try_recv().unwrap();
    assert_eq!(notification.user_id, "alice");
    assert_eq!(notification.pass_time, rise);

    scheduler.run_cycle(rise + ChronoDuration::minutes(5)).unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    let stored = store.for_user("alice").unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].notified);
}

#[test]
fn no_subscribers_still_marks_handled() {
    let store = Arc::new(ReminderStore::in_memory().unwrap());
    let t = Utc.with_ymd_and_hms(2024, 8, 30, 10, 15, 0).unwrap();
    store.add("bob", t).unwrap();

    let scheduler = ReminderScheduler::new(
        store.clone(),
        Arc::new(ChannelNotifier::new(4)),
        Duration::from_secs(60),
    );
    assert_eq!(scheduler.run_cycle(t).unwrap().dispatched, 1);
    assert!(store.due_reminders(t).unwrap().is_empty());
}
