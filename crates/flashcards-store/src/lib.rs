// ABOUTME: Storage engine for the flashcards backend, backed by a single SQLite file.
// ABOUTME: Every call is serialized by one lock and every mutation runs in its own transaction.

pub mod accounts;
pub mod entities;
pub mod sqlite;

pub use accounts::UserInsert;
pub use entities::CardInsert;
pub use sqlite::{Store, StoreError};
