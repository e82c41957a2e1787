pub mod crew;
pub mod error;
pub mod notifications;
pub mod predict;
pub mod reminders;
pub mod scheduler;
pub mod tracker;
