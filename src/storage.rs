//! Local persistence for users, movements, and workouts.
//!
//! Everything lives in one `SQLite` file:
//!
//! ```text
//! ~/.flexcreek/flexcreek.sqlite
//!   users               # Workout owners
//!   muscles             # Reference data
//!   movements           # Reusable exercise definitions
//!   movement_muscles    # Which muscles each movement works
//!   workouts            # One row per session
//!   movement_instances  # Performances within a workout, log as JSON text
//! ```
//!
//! Every operation opens its own connection and drops it before returning.
//! Multi-row writes run inside a single transaction; a transaction that is
//! dropped without commit rolls back.

mod log_codec;
mod movement;
mod movement_instance;
mod muscle;
mod user;
mod workout;

use std::{fs, io, path::PathBuf, time::Duration};

use jiff::{Timestamp, civil::Date};
use rusqlite::{Connection, ErrorCode};

pub use movement_instance::InstanceStore;

/// How long a connection waits on a lock held by another writer.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name      TEXT NOT NULL,
    last_name       TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS muscles (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movements (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL UNIQUE,
    movement_type TEXT NOT NULL,
    description   TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movement_muscles (
    movement_id INTEGER NOT NULL REFERENCES movements(id) ON DELETE CASCADE,
    muscle_id   INTEGER NOT NULL REFERENCES muscles(id) ON DELETE CASCADE,
    PRIMARY KEY (movement_id, muscle_id)
);

CREATE TABLE IF NOT EXISTS workouts (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    workout_date     TEXT NOT NULL,
    notes            TEXT NOT NULL DEFAULT '',
    duration_seconds INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS workouts_user_date ON workouts (user_id, workout_date);

CREATE TABLE IF NOT EXISTS movement_instances (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_id  INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    movement_id INTEGER NOT NULL REFERENCES movements(id),
    notes       TEXT NOT NULL DEFAULT '',
    rpe         INTEGER CHECK (rpe IS NULL OR rpe BETWEEN 1 AND 10),
    log_data    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS movement_instances_workout ON movement_instances (workout_id);
CREATE INDEX IF NOT EXISTS movement_instances_movement ON movement_instances (movement_id);
";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The caller passed something that can never be stored.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A unique or foreign-key constraint rejected the write.
    #[error("{op}: constraint violated: {detail}")]
    ConstraintViolation { op: &'static str, detail: String },

    /// The database could not be reached or failed mid-operation.
    #[error("{op}: database unavailable: {source}")]
    Unavailable {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A stored row could not be read back.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    fn from_sqlite(op: &'static str, source: rusqlite::Error) -> Self {
        match source {
            rusqlite::Error::SqliteFailure(err, detail)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation {
                    op,
                    detail: detail.unwrap_or_else(|| err.to_string()),
                }
            }
            source => Self::Unavailable { op, source },
        }
    }
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Attaches the failing operation's name to a `rusqlite` error.
pub(crate) trait Context<T> {
    fn op(self, op: &'static str) -> Result<T>;
}

impl<T> Context<T> for rusqlite::Result<T> {
    fn op(self, op: &'static str) -> Result<T> {
        self.map_err(|e| StorageError::from_sqlite(op, e))
    }
}

/// `SQLite`-backed storage for the whole domain.
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Creates a storage instance backed by the database file at `path`.
    ///
    /// The parent directory and the schema are created if they don't exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let storage = Self { path };
        storage
            .open()?
            .execute_batch(SCHEMA)
            .op("apply schema")?;
        tracing::debug!(path = %storage.path.display(), "Storage ready");
        Ok(storage)
    }

    /// Returns the default database path: `~/.flexcreek/flexcreek.sqlite`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".flexcreek").join("flexcreek.sqlite"))
    }

    /// Opens a fresh connection with foreign keys enforced.
    pub(crate) fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).op("open database")?;
        conn.busy_timeout(BUSY_TIMEOUT).op("open database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .op("open database")?;
        Ok(conn)
    }
}

/// Renders a timestamp for storage.
///
/// Fixed nanosecond precision keeps text order equal to time order.
pub(crate) fn timestamp_text(ts: Timestamp) -> String {
    format!("{ts:.9}")
}

pub(crate) fn parse_timestamp(text: &str, field: &str) -> Result<Timestamp> {
    text.parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {field}: {e}")))
}

pub(crate) fn parse_date(text: &str) -> Result<Date> {
    text.parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid workout date: {e}")))
}
