// ABOUTME: User and session persistence: account creation, lookups, and session issue/rotate/delete.
// ABOUTME: Session writes that must happen together (login replacement, rotation) share one transaction.

use flashcards_core::{RowId, Session, User};
use rusqlite::{OptionalExtension, Row, params};

use crate::sqlite::Store;

/// Outcome of registering a password user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInsert {
    Created { user: User, session: Session },
    Taken,
    Failed,
}

const USER_COLUMNS: &str = "id, username, external_id, display_name, password_hash";
const SESSION_COLUMNS: &str =
    "access_token, refresh_token, user_id, access_expires, refresh_expires";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        external_id: row.get(2)?,
        display_name: row.get(3)?,
        password_hash: row.get(4)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        access_token: row.get(0)?,
        refresh_token: row.get(1)?,
        user_id: row.get(2)?,
        access_expires: row.get(3)?,
        refresh_expires: row.get(4)?,
    })
}

impl Store {
    /// Create a password user together with their first session, both in
    /// one transaction. `issue` builds the session once the user id exists.
    pub fn register_user(
        &self,
        username: &str,
        password_hash: &str,
        issue: impl FnOnce(RowId) -> Session,
    ) -> UserInsert {
        self.with_conn("register user", |conn| {
            let tx = conn.transaction()?;
            let taken = tx
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1",
                    params![username],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if taken {
                tracing::debug!(username, "username already registered");
                return Ok(UserInsert::Taken);
            }

            tx.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                params![username, password_hash],
            )?;
            let id = tx.last_insert_rowid();
            let session = issue(id);
            insert_session_row(&tx, &session)?;
            tx.commit()?;

            Ok(UserInsert::Created {
                user: User {
                    id,
                    username: Some(username.to_string()),
                    external_id: None,
                    display_name: None,
                    password_hash: Some(password_hash.to_string()),
                },
                session,
            })
        })
        .unwrap_or(UserInsert::Failed)
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        self.with_conn("user by username", |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                    params![username],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
        .flatten()
    }

    /// Look up the user bound to a third-party identity, creating it on first
    /// sign-in.
    pub fn find_or_create_external_user(
        &self,
        external_id: &str,
        display_name: &str,
    ) -> Option<User> {
        self.with_conn("find or create external user", |conn| {
            let tx = conn.transaction()?;
            let existing = tx
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1"),
                    params![external_id],
                    user_from_row,
                )
                .optional()?;
            if let Some(user) = existing {
                return Ok(user);
            }

            tx.execute(
                "INSERT INTO users (external_id, display_name) VALUES (?1, ?2)",
                params![external_id, display_name],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            tracing::info!(user_id = id, "created user for external identity");
            Ok(User {
                id,
                username: None,
                external_id: Some(external_id.to_string()),
                display_name: Some(display_name.to_string()),
                password_hash: None,
            })
        })
    }

    /// Store a new session alongside any the user already holds.
    pub fn insert_session(&self, session: &Session) -> bool {
        self.with_conn_bool("insert session", |conn| {
            let tx = conn.transaction()?;
            insert_session_row(&tx, session)?;
            tx.commit()?;
            Ok(true)
        })
    }

    /// Delete every session of `session.user_id` and store `session` in its
    /// place, in one transaction.
    pub fn replace_user_sessions(&self, session: &Session) -> bool {
        self.with_conn_bool("replace user sessions", |conn| {
            let tx = conn.transaction()?;
            let dropped = tx.execute(
                "DELETE FROM sessions WHERE user_id = ?1",
                params![session.user_id],
            )?;
            insert_session_row(&tx, session)?;
            tx.commit()?;

            if dropped > 0 {
                tracing::debug!(user_id = session.user_id, dropped, "invalidated previous sessions");
            }
            Ok(true)
        })
    }

    pub fn session_by_access_token(&self, access_token: &str) -> Option<Session> {
        self.with_conn("session by access token", |conn| {
            let session = conn
                .query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE access_token = ?1"),
                    params![access_token],
                    session_from_row,
                )
                .optional()?;
            Ok(session)
        })
        .flatten()
    }

    pub fn session_by_refresh_token(&self, refresh_token: &str) -> Option<Session> {
        self.with_conn("session by refresh token", |conn| {
            let session = conn
                .query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE refresh_token = ?1"),
                    params![refresh_token],
                    session_from_row,
                )
                .optional()?;
            Ok(session)
        })
        .flatten()
    }

    /// Overwrite the session currently holding `old_refresh_token` with the
    /// tokens and expirations of `next`. Fails if no row holds that token,
    /// so a refresh token can be rotated at most once.
    pub fn rotate_session(&self, old_refresh_token: &str, next: &Session) -> bool {
        self.with_conn_bool("rotate session", |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE sessions
                 SET access_token = ?1, refresh_token = ?2, access_expires = ?3, refresh_expires = ?4
                 WHERE refresh_token = ?5 AND user_id = ?6",
                params![
                    next.access_token,
                    next.refresh_token,
                    next.access_expires,
                    next.refresh_expires,
                    old_refresh_token,
                    next.user_id,
                ],
            )?;
            if changed != 1 {
                return Ok(false);
            }
            tx.commit()?;
            Ok(true)
        })
    }

    /// Delete the session keyed by `access_token`. Returns false when no row
    /// was deleted.
    pub fn delete_session(&self, access_token: &str) -> bool {
        self.with_conn_bool("delete session", |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "DELETE FROM sessions WHERE access_token = ?1",
                params![access_token],
            )?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    /// Number of live session rows for a user.
    pub fn session_count(&self, user_id: RowId) -> Option<usize> {
        self.with_conn("count sessions", |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sessions WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
    }
}

fn insert_session_row(conn: &rusqlite::Connection, session: &Session) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO sessions (access_token, refresh_token, user_id, access_expires, refresh_expires)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session.access_token,
            session.refresh_token,
            session.user_id,
            session.access_expires,
            session.refresh_expires,
        ],
    )
}
