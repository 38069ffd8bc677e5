// ABOUTME: SQLite-backed storage engine shared by every connection through one process-wide lock.
// ABOUTME: Opens the database, creates the schema, and funnels every call through a single mutex.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

/// Errors that can occur inside the storage engine. They are logged at the
/// engine boundary and never handed to callers past `open`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Handle to the flashcards database. Cloning is cheap; all clones share the
/// same connection and the same lock, so at most one statement group runs at
/// any instant.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the database file at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // Cards and folders reference owners and folders by id only; scoping
        // in every statement stands in for foreign keys.
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE,
                external_id TEXT UNIQUE,
                display_name TEXT,
                password_hash TEXT
            );

            CREATE TABLE IF NOT EXISTS sessions (
                access_token TEXT PRIMARY KEY,
                refresh_token TEXT NOT NULL UNIQUE,
                user_id INTEGER NOT NULL,
                access_expires TEXT NOT NULL,
                refresh_expires TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS sessions_user ON sessions (user_id);

            CREATE TABLE IF NOT EXISTS folders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                name TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS folders_owner ON folders (owner_id);

            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                folder_id INTEGER NOT NULL,
                term TEXT NOT NULL,
                translation TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS cards_scope ON cards (owner_id, folder_id);",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` while holding the global lock. A failure is logged and
    /// flattened to `None`; nothing below this line escapes to the caller.
    pub(crate) fn with_conn<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Option<T> {
        let mut conn = match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // A panic mid-call dropped its transaction, which rolled back.
                tracing::warn!(op, "storage lock was poisoned; continuing");
                poisoned.into_inner()
            }
        };

        match f(&mut conn) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(op, error = %e, "storage call failed");
                None
            }
        }
    }

    /// Like `with_conn`, but a mutating call reports only success or failure.
    pub(crate) fn with_conn_bool(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Connection) -> Result<bool, StoreError>,
    ) -> bool {
        self.with_conn(op, f).unwrap_or(false)
    }
}
