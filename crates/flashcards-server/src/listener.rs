// ABOUTME: Accept loop that hands every incoming socket to its own ConnectionActor.
// ABOUTME: Accept failures are logged and retried; shutdown stops accepting but not running connections.

use std::future::Future;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::connection::ConnectionActor;

/// Back-off after a failed accept, e.g. when file descriptors run out.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Accept connections forever.
pub async fn serve(listener: TcpListener, app: Router) {
    serve_with_shutdown(listener, app, std::future::pending()).await
}

/// Accept connections until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(listener: TcpListener, app: Router, shutdown: F)
where
    F: Future<Output = ()>,
{
    match listener.local_addr() {
        Ok(addr) => tracing::info!(%addr, "listening"),
        Err(e) => tracing::warn!(error = %e, "listener has no local address"),
    }

    tokio::pin!(shutdown);
    let mut next_id: u64 = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(accepted = next_id, "shutdown requested, no longer accepting");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    next_id += 1;
                    ConnectionActor::new(next_id, peer, stream, app.clone()).spawn();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            },
        }
    }
}
