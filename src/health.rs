//! Liveness endpoint for external process monitors.

use std::net::SocketAddr;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::info;

/// Build the liveness router. It holds no state, so its answer never depends
/// on whether the Discord gateway is connected.
pub fn router() -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(liveness))
}

async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve the liveness router on `0.0.0.0:port` until `shutdown` flips to true.
pub async fn serve(port: u16, mut shutdown: watch::Receiver<bool>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🩺 Liveness endpoint listening on http://{addr}");

    axum::serve(listener, router())
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    info!("Liveness endpoint stopped");
    Ok(())
}
