pub mod notifier;
pub mod runner;
pub mod storage;

pub use notifier::{ChannelNotifier, Notification, Notifier, NotifyError, NOTIFICATIONS_TOPIC};
pub use runner::{
    CycleReport, ReminderScheduler, SchedulerHandle, SchedulerMonitor, SchedulerState,
    SchedulerStatus,
};
pub use storage::{Reminder, ReminderStore, StorageError};
