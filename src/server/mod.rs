//! HTTP API
//!
//! Routes:
//! - `GET /` - welcome text
//! - `GET /health` - liveness probe
//! - `GET /scrape?url=<target>` - run a scrape and return the result as JSON

mod error;
mod handlers;

pub use error::ApiError;

use crate::pipeline::Orchestrator;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builds the application router
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/scrape", get(handlers::scrape))
        .layer(TraceLayer::new_for_http())
        .with_state(orchestrator)
}

/// Serves the API until Ctrl-C is received
pub async fn serve(addr: SocketAddr, orchestrator: Arc<Orchestrator>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(orchestrator))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
