// ABOUTME: Entry point for the flashcards binary.
// ABOUTME: Parses CLI arguments, initializes tracing, opens the store, and starts the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use flashcards_server::{AppState, GoogleVerifier, ServerConfig, TokenPolicy};
use flashcards_store::Store;

#[derive(Debug, Parser)]
#[command(name = "flashcards", version, about = "Flashcards backend over HTTP/1.1")]
struct Args {
    /// Address to listen on (overrides FLASHCARDS_BIND).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// SQLite database file (overrides FLASHCARDS_DB).
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "flashcards=debug,flashcards_server=debug,tower_http=debug",
                )
            }),
        )
        .init();

    let mut config = ServerConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(db) = args.db {
        config.database = db;
    }
    tracing::info!(bind = %config.bind, db = %config.database.display(), "flashcards starting up");

    let store = Store::open(&config.database)
        .with_context(|| format!("failed to open database {}", config.database.display()))?;
    let policy = TokenPolicy {
        access_ttl: config.access_ttl,
        refresh_ttl: config.refresh_ttl,
    };

    let mut state = AppState::new(store, policy);
    match config.google_client_id.clone() {
        Some(client_id) => {
            state = state.with_identity_verifier(Arc::new(GoogleVerifier::new(client_id)));
        }
        None => tracing::info!("FLASHCARDS_GOOGLE_CLIENT_ID unset, google sign-in disabled"),
    }

    let app = flashcards_server::create_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    flashcards_server::serve_with_shutdown(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await;

    tracing::info!("flashcards stopped");
    Ok(())
}
