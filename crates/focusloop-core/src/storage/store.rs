//! SQLite-backed persistence for session state and history.
//!
//! Two independent surfaces share one database file:
//! - a kv table holding the current [`SessionState`] snapshot as JSON
//!   under a fixed key, rewritten after every engine mutation;
//! - an append-only `history` table of completed-session records.
//!
//! Missing or corrupt state is never fatal: `load_state` returns `None`
//! and the caller falls back to the default idle state.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::{Result, StorageError};
use crate::session::SessionState;

const STATE_KEY: &str = "session_state";

/// One finished session, written once at the terminal transition and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub started_at: DateTime<Utc>,
    /// Seconds actually spent, not the configured total.
    pub duration_secs: u64,
    pub preset_label: Option<String>,
    /// True only if the session ran to zero remaining time.
    pub completed: bool,
}

impl HistoryRecord {
    pub fn new(
        started_at: DateTime<Utc>,
        duration_secs: u64,
        preset_label: Option<String>,
        completed: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at,
            duration_secs,
            preset_label,
            completed,
        }
    }
}

/// SQLite store for the session snapshot and the history log.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open the database at `<data_dir>/focusloop.db`, creating the
    /// file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("focusloop.db");
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open the database at an explicit path (tests, simulations).
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS history (
                    id            TEXT PRIMARY KEY,
                    started_at    TEXT NOT NULL,
                    duration_secs INTEGER NOT NULL,
                    preset_label  TEXT,
                    completed     INTEGER NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_history_started_at ON history(started_at);",
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// Write the current session snapshot.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails. Callers in
    /// the engine treat this as best-effort.
    pub fn save_state(&self, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.kv_set(STATE_KEY, &json)?;
        Ok(())
    }

    /// Read the persisted session snapshot.
    ///
    /// Returns `None` when no snapshot exists or the stored value does
    /// not parse; corruption downgrades to "no prior state".
    pub fn load_state(&self) -> Option<SessionState> {
        let json = match self.kv_get(STATE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted session state");
                return None;
            }
        };
        match serde_json::from_str(&json) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(error = %e, "persisted session state is corrupt, starting fresh");
                None
            }
        }
    }

    /// Append one completed-session record to the history log.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn append_history(&self, record: &HistoryRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO history (id, started_at, duration_secs, preset_label, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.started_at.to_rfc3339(),
                    record.duration_secs,
                    record.preset_label,
                    record.completed,
                ],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    /// All history records, newest first.
    pub fn load_history(&self) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, started_at, duration_secs, preset_label, completed
                 FROM history ORDER BY started_at DESC",
            )
            .map_err(StorageError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, bool>(4)?,
                ))
            })
            .map_err(StorageError::from)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, started_at, duration_secs, preset_label, completed) =
                row.map_err(StorageError::from)?;
            let started_at = DateTime::parse_from_rfc3339(&started_at)
                .map_err(|e| StorageError::QueryFailed(e.to_string()))?
                .with_timezone(&Utc);
            records.push(HistoryRecord {
                id,
                started_at,
                duration_secs,
                preset_label,
                completed,
            });
        }
        Ok(records)
    }

    fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
