// ABOUTME: One actor per accepted TCP socket, serving sequential HTTP/1.1 exchanges over keep-alive.
// ABOUTME: Each exchange is handed to the router; the actor lives until the peer or an I/O error closes it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tracing::Instrument;

/// Owns one client socket for its whole lifetime.
pub struct ConnectionActor {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
    app: Router,
}

impl ConnectionActor {
    pub fn new(id: u64, peer: SocketAddr, stream: TcpStream, app: Router) -> Self {
        Self {
            id,
            peer,
            stream,
            app,
        }
    }

    /// Run the actor on its own task. The task owns the socket, so an
    /// in-flight read or write always completes against a live actor.
    pub fn spawn(self) -> JoinHandle<()> {
        let span = tracing::info_span!("connection", id = self.id, peer = %self.peer);
        tokio::spawn(self.run().instrument(span))
    }

    /// Serve requests until the connection closes. HTTP/1.1 without
    /// pipelining: each response is written before the next request is read.
    pub async fn run(self) {
        tracing::debug!("connection opened");

        let exchanges = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&exchanges);
        let app = self.app;
        let service = service_fn(move |req: hyper::Request<Incoming>| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(exchange = n, method = %req.method(), uri = %req.uri(), "dispatching");
            app.clone().oneshot(req)
        });

        let result = http1::Builder::new()
            .keep_alive(true)
            .serve_connection(TokioIo::new(self.stream), service)
            .await;

        let served = exchanges.load(Ordering::Relaxed);
        match result {
            Ok(()) => tracing::debug!(exchanges = served, "connection closed"),
            Err(e) if e.is_incomplete_message() => {
                tracing::debug!(exchanges = served, "peer closed mid-request")
            }
            Err(e) => tracing::warn!(exchanges = served, error = %e, "connection failed"),
        }
    }
}
