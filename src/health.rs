// Liveness endpoint for hosting platforms that probe an HTTP port

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;

pub const ALIVE: &str = "Bot is alive!";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { ALIVE }))
}

/// Serve the liveness route on `0.0.0.0:{port}` in the background.
///
/// Bind or serve errors are logged and end only this task.
pub fn spawn(port: u16) -> JoinHandle<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!("Liveness server failed to bind {}: {}", addr, e);
                return;
            }
        };

        tracing::info!("Liveness server listening on {}", addr);
        if let Err(e) = axum::serve(listener, router()).await {
            tracing::error!("Liveness server error: {}", e);
        }
    })
}
