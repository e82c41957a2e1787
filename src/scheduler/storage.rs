use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS reminders (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        pass_time_ns INTEGER NOT NULL,
        notified INTEGER NOT NULL DEFAULT 0,
        created_at_ms INTEGER NOT NULL,
        UNIQUE (user_id, pass_time_ns)
    );
    CREATE INDEX IF NOT EXISTS reminders_due ON reminders (notified, pass_time_ns);
";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub pass_time: DateTime<Utc>,
    pub notified: bool,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("user id must not be empty")]
    EmptyUser,
    #[error("pass time {0} is outside the storable range")]
    PassTimeOutOfRange(DateTime<Utc>),
    #[error("database connection lock poisoned")]
    Poisoned,
}

/// Durable table of pending pass notifications.
///
/// Each public method runs as one SQLite transaction. Dispatched rows are kept
/// and flagged `notified`, never deleted.
pub struct ReminderStore {
    conn: Mutex<Connection>,
}

impl ReminderStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("Reminder database {} journal mode {}", path.display(), mode);
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Register a reminder. Returns `false` when the `(user, pass time)`
    /// pair already exists; the existing row is left untouched.
    pub fn add(&self, user_id: &str, pass_time: DateTime<Utc>) -> Result<bool, StorageError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(StorageError::EmptyUser);
        }

        let pass_time_ns = pass_time
            .timestamp_nanos_opt()
            .ok_or(StorageError::PassTimeOutOfRange(pass_time))?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO reminders (id, user_id, pass_time_ns, notified, created_at_ms)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                uuid::Uuid::new_v4().to_string(),
                user_id,
                pass_time_ns,
                Utc::now().timestamp_millis()
            ],
        )?;
        tx.commit()?;

        if inserted == 0 {
            log::debug!("Reminder for {} at {} already registered", user_id, pass_time);
        } else {
            log::info!("Registered reminder for {} at {}", user_id, pass_time);
        }
        Ok(inserted > 0)
    }

    /// Unnotified reminders whose pass time is at or before `now`, oldest first.
    pub fn due_reminders(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, StorageError> {
        // Outside the storable range, clamp to the nearest end.
        let now_ns = now
            .timestamp_nanos_opt()
            .unwrap_or(if now.timestamp() < 0 { i64::MIN } else { i64::MAX });
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare(
                "SELECT id, user_id, pass_time_ns, notified FROM reminders
                 WHERE notified = 0 AND pass_time_ns <= ?1
                 ORDER BY pass_time_ns, id",
            )?;
            let rows = stmt
                .query_map(params![now_ns], read_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        tx.commit()?;
        Ok(rows.into_iter().map(into_reminder).collect())
    }

    /// Flag a reminder as dispatched. Returns `false` if it was already
    /// flagged or does not exist.
    pub fn mark_handled(&self, reminder_id: &str) -> Result<bool, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            "UPDATE reminders SET notified = 1 WHERE id = ?1 AND notified = 0",
            params![reminder_id],
        )?;
        tx.commit()?;
        Ok(updated > 0)
    }

    pub fn for_user(&self, user_id: &str) -> Result<Vec<Reminder>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, pass_time_ns, notified FROM reminders
             WHERE user_id = ?1
             ORDER BY pass_time_ns",
        )?;
        let rows = stmt
            .query_map(params![user_id.trim()], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().map(into_reminder).collect())
    }

    pub fn get(&self, reminder_id: &str) -> Result<Option<Reminder>, StorageError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, user_id, pass_time_ns, notified FROM reminders WHERE id = ?1",
                params![reminder_id],
                read_row,
            )
            .optional()?;
        Ok(row.map(into_reminder))
    }
}

type Row = (String, String, i64, bool);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_reminder((id, user_id, pass_time_ns, notified): Row) -> Reminder {
    Reminder {
        id,
        user_id,
        pass_time: DateTime::from_timestamp_nanos(pass_time_ns),
        notified,
    }
}
