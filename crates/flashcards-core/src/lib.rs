// ABOUTME: Core library for the flashcards backend, containing domain types and input validation.
// ABOUTME: This crate defines the shared data model used by the store and the server.

pub mod input;
pub mod model;

pub use input::{CardInput, Credentials, ExternalSignIn, FolderInput, ValidationError};
pub use model::{Card, Folder, RowId, Session, SessionTokens, User};
