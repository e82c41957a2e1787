use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use utoipa::ToSchema;

use crate::scheduler::{Notification, Notifier, ReminderStore, StorageError};

const MIN_PERIOD: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Polling,
    Dispatching { remaining: usize },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub running: bool,
    pub last_cycle: Option<DateTime<Utc>>,
    pub dispatched_total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub due: usize,
    pub dispatched: usize,
    pub failed: usize,
}

/// Polls the reminder store and hands due reminders to the notifier.
#[derive(Clone)]
pub struct ReminderScheduler {
    store: Arc<ReminderStore>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
    shared: Arc<StdMutex<SchedulerStatus>>,
}

/// Read-only view of a scheduler's status.
#[derive(Clone)]
pub struct SchedulerMonitor {
    shared: Arc<StdMutex<SchedulerStatus>>,
}

impl SchedulerMonitor {
    pub fn status(&self) -> SchedulerStatus {
        lock(&self.shared).clone()
    }
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the background loop started by [`ReminderScheduler::start`].
pub struct SchedulerHandle {
    monitor: SchedulerMonitor,
    worker: Option<WorkerHandle>,
}

impl SchedulerHandle {
    pub fn monitor(&self) -> SchedulerMonitor {
        self.monitor.clone()
    }

    /// Stop the loop and wait for an in-flight cycle to finish.
    pub async fn shutdown(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if let Err(e) = worker.join.await {
                log::error!("Reminder scheduler task ended abnormally: {}", e);
            }
        }
    }
}

fn lock(shared: &StdMutex<SchedulerStatus>) -> MutexGuard<'_, SchedulerStatus> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ReminderScheduler {
    /// `period` is clamped to a small positive minimum.
    pub fn new(store: Arc<ReminderStore>, notifier: Arc<dyn Notifier>, period: Duration) -> Self {
        if period < MIN_PERIOD {
            log::warn!(
                "Reminder poll period {} too short, using {}",
                humantime::format_duration(period),
                humantime::format_duration(MIN_PERIOD)
            );
        }
        let period = period.max(MIN_PERIOD);
        Self {
            store,
            notifier,
            period,
            shared: Arc::new(StdMutex::new(SchedulerStatus {
                state: SchedulerState::Idle,
                running: false,
                last_cycle: None,
                dispatched_total: 0,
            })),
        }
    }

    pub fn monitor(&self) -> SchedulerMonitor {
        SchedulerMonitor {
            shared: self.shared.clone(),
        }
    }

    fn set_state(&self, state: SchedulerState) {
        lock(&self.shared).state = state;
    }

    /// One Polling -> Dispatching -> Idle pass over reminders due at `now`.
    ///
    /// A reminder whose notification fails stays unnotified and is retried on
    /// the next cycle.
    pub fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, StorageError> {
        self.set_state(SchedulerState::Polling);
        let result = self.dispatch_due(now);

        let mut locked = lock(&self.shared);
        locked.state = SchedulerState::Idle;
        if let Ok(report) = &result {
            locked.last_cycle = Some(now);
            locked.dispatched_total += report.dispatched as u64;
        }
        result
    }

    fn dispatch_due(&self, now: DateTime<Utc>) -> Result<CycleReport, StorageError> {
        let due = self.store.due_reminders(now)?;
        let mut report = CycleReport {
            due: due.len(),
            ..CycleReport::default()
        };

        for (i, reminder) in due.iter().enumerate() {
            self.set_state(SchedulerState::Dispatching {
                remaining: due.len() - i,
            });

            if let Err(e) = self.notifier.notify(Notification::for_reminder(reminder)) {
                log::warn!(
                    "Notification for reminder {} ({}) failed: {}",
                    reminder.id,
                    reminder.user_id,
                    e
                );
                report.failed += 1;
                continue;
            }

            if self.store.mark_handled(&reminder.id)? {
                log::info!(
                    "Notified {} of pass at {}",
                    reminder.user_id,
                    reminder.pass_time
                );
                report.dispatched += 1;
            } else {
                log::debug!("Reminder {} was already handled", reminder.id);
            }
        }

        Ok(report)
    }

    /// Spawn the polling loop on the current tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let monitor = self.monitor();
        let (stop_tx, stop_rx) = oneshot::channel();

        lock(&self.shared).running = true;
        let join = tokio::spawn(run_scheduler_loop(self, stop_rx));

        SchedulerHandle {
            monitor,
            worker: Some(WorkerHandle { stop_tx, join }),
        }
    }
}

async fn run_scheduler_loop(scheduler: ReminderScheduler, mut stop_rx: oneshot::Receiver<()>) {
    log::info!(
        "Reminder scheduler started (every {})",
        humantime::format_duration(scheduler.period)
    );

    let mut ticker = tokio::time::interval(scheduler.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let should_stop = tokio::select! {
            _ = ticker.tick() => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            break;
        }

        let cycle = scheduler.clone();
        let now = Utc::now();
        match tokio::task::spawn_blocking(move || cycle.run_cycle(now)).await {
            Ok(Ok(report)) if report.due > 0 => {
                log::info!(
                    "Reminder cycle: {} due, {} dispatched, {} failed",
                    report.due,
                    report.dispatched,
                    report.failed
                );
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => log::error!("Reminder cycle failed: {}", e),
            Err(e) => log::error!("Reminder cycle panicked: {}", e),
        }
    }

    let mut locked = lock(&scheduler.shared);
    locked.state = SchedulerState::Idle;
    locked.running = false;
    log::info!("Reminder scheduler stopped");
}
