// ABOUTME: HTTP/1.1 server for flashcards: per-connection actors, session auth, and folder/card CRUD.
// ABOUTME: Uses Axum for routing on top of hyper connections owned by one task each.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod connection;
pub mod identity;
pub mod listener;
pub mod routes;
pub mod session;

pub use app_state::{AppState, SharedState};
pub use config::ServerConfig;
pub use identity::GoogleVerifier;
pub use listener::{serve, serve_with_shutdown};
pub use routes::create_router;
pub use session::{AuthManager, TokenPolicy};
