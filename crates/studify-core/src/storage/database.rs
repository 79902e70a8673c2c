//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed focus sessions
//! - Focus statistics (today and all-time)
//! - Key-value store for small bits of CLI state

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError, SinkError};
use crate::session::{SessionLog, SessionStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: i64,
    #[serde(flatten)]
    pub log: SessionLog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FocusStats {
    pub pomodoros_completed: u64,
    pub total_focus_mins: u64,
    pub today_pomodoros: u64,
    pub today_focus_mins: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studify/studify.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studify.db");
        Ok(Self::open_at(&path)?)
    }

    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id            INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id       TEXT NOT NULL,
                    subject       TEXT,
                    duration_mins INTEGER NOT NULL,
                    started_at    TEXT NOT NULL,
                    completed_at  TEXT NOT NULL,
                    was_completed INTEGER NOT NULL DEFAULT 1
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user_completed
                    ON sessions(user_id, completed_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Record a completed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, log: &SessionLog) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (user_id, subject, duration_mins, started_at, completed_at, was_completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log.user_id,
                log.subject,
                log.duration_minutes,
                timestamp(log.started_at),
                timestamp(log.completed_at),
                log.was_completed,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions for `user_id`, newest first.
    pub fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, subject, duration_mins, started_at, completed_at, was_completed
             FROM sessions
             WHERE user_id = ?1
             ORDER BY completed_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, bool>(6)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, user_id, subject, duration_minutes, started_at, completed_at, was_completed) =
                row?;
            sessions.push(StoredSession {
                id,
                log: SessionLog {
                    user_id,
                    subject,
                    duration_minutes,
                    started_at: parse_timestamp(&started_at)?,
                    completed_at: parse_timestamp(&completed_at)?,
                    was_completed,
                },
            });
        }
        Ok(sessions)
    }

    /// All-time and per-day focus totals for `user_id`. `today` is a UTC date.
    pub fn focus_stats(&self, user_id: &str, today: NaiveDate) -> Result<FocusStats, DatabaseError> {
        let (all_count, all_mins) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_mins), 0)
             FROM sessions
             WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;

        let day_start = today.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let day_end = day_start + Duration::days(1);
        let (today_count, today_mins) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_mins), 0)
             FROM sessions
             WHERE user_id = ?1 AND completed_at >= ?2 AND completed_at < ?3",
            params![user_id, timestamp(day_start), timestamp(day_end)],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;

        Ok(FocusStats {
            pomodoros_completed: all_count,
            total_focus_mins: all_mins,
            today_pomodoros: today_count,
            today_focus_mins: today_mins,
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Local session store for use behind a [`SinkDispatcher`].
///
/// Inserts run on tokio's blocking pool, so a locked database file stalls
/// only the writer and never the timer task.
///
/// [`SinkDispatcher`]: crate::session::SinkDispatcher
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open the store in the data directory.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self::new(Database::open()?))
    }
}

impl SessionStore for LocalStore {
    async fn insert_session(&self, log: &SessionLog) -> Result<(), SinkError> {
        let db = Arc::clone(&self.db);
        let log = log.clone();
        tokio::task::spawn_blocking(move || -> Result<(), SinkError> {
            let db = db
                .lock()
                .map_err(|_| SinkError::Store("database mutex poisoned".into()))?;
            let id = db.record_session(&log)?;
            tracing::info!(id, user = %log.user_id, "session log recorded");
            Ok(())
        })
        .await
        .map_err(|e| SinkError::Store(e.to_string()))?
    }
}

// Fixed-width UTC timestamps so text comparison matches time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log_at(user: &str, completed_at: DateTime<Utc>, subject: Option<&str>) -> SessionLog {
        SessionLog {
            user_id: user.into(),
            subject: subject.map(str::to_string),
            duration_minutes: 25,
            started_at: completed_at - Duration::minutes(25),
            completed_at,
            was_completed: true,
        }
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        let at = Utc.with_ymd_and_hms(2026, 5, 4, 10, 30, 0).unwrap();
        db.record_session(&log_at("u1", at, Some("History"))).unwrap();

        let sessions = db.recent_sessions("u1", 10).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].log.subject.as_deref(), Some("History"));
        assert_eq!(sessions[0].log.completed_at, at);
        assert!(sessions[0].log.was_completed);
    }

    #[test]
    fn stats_bucket_by_utc_day_and_user() {
        let db = Database::open_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2026, 5, d, h, 0, 0).unwrap();

        db.record_session(&log_at("u1", at(3, 23), None)).unwrap();
        db.record_session(&log_at("u1", at(4, 0), None)).unwrap();
        db.record_session(&log_at("u1", at(4, 18), None)).unwrap();
        db.record_session(&log_at("u1", at(5, 0), None)).unwrap();
        db.record_session(&log_at("u2", at(4, 12), None)).unwrap();

        let stats = db.focus_stats("u1", today).unwrap();
        assert_eq!(stats.pomodoros_completed, 4);
        assert_eq!(stats.total_focus_mins, 100);
        assert_eq!(stats.today_pomodoros, 2);
        assert_eq!(stats.today_focus_mins, 50);
    }

    #[test]
    fn empty_stats_are_zero() {
        let db = Database::open_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        assert_eq!(db.focus_stats("nobody", today).unwrap(), FocusStats::default());
    }

    #[test]
    fn recent_sessions_newest_first_with_limit() {
        let db = Database::open_memory().unwrap();
        for h in 8..12 {
            let at = Utc.with_ymd_and_hms(2026, 5, 4, h, 0, 0).unwrap();
            db.record_session(&log_at("u1", at, None)).unwrap();
        }
        let sessions = db.recent_sessions("u1", 2).unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[0].log.completed_at > sessions[1].log.completed_at);
    }

    #[tokio::test]
    async fn local_store_inserts_off_the_calling_task() {
        let store = LocalStore::new(Database::open_memory().unwrap());
        store
            .insert_session(&log_at("u1", Utc::now(), Some("Art")))
            .await
            .unwrap();
        let db = store.db.lock().unwrap();
        let sessions = db.recent_sessions("u1", 5).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].log.subject.as_deref(), Some("Art"));
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }
}
