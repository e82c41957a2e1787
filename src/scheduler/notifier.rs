use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use utoipa::ToSchema;

use crate::scheduler::Reminder;

pub const NOTIFICATIONS_TOPIC: &str = "notifications";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notification {
    pub user_id: String,
    pub pass_time: DateTime<Utc>,
    pub message: String,
}

impl Notification {
    pub fn for_reminder(reminder: &Reminder) -> Self {
        Self {
            user_id: reminder.user_id.clone(),
            pass_time: reminder.pass_time,
            message: format!(
                "The tracked satellite will pass overhead at {}",
                reminder.pass_time.to_rfc3339()
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound side of the push channel. Delivery is fire-and-forget: an `Ok`
/// means the notification was handed off, not that a client received it.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Publishes on the in-process "notifications" topic.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let user_id = notification.user_id.clone();
        match self.tx.send(notification) {
            Ok(receivers) => {
                log::debug!(
                    "Published {} notification for {} to {} subscribers",
                    NOTIFICATIONS_TOPIC,
                    user_id,
                    receivers
                );
            }
            Err(_) => {
                log::debug!("No {} subscribers for {}", NOTIFICATIONS_TOPIC, user_id);
            }
        }
        Ok(())
    }
}
