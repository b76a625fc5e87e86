//! HTTP server for model serving
//!
//! This module provides the main HTTP server with:
//! - Single-shot inference at /inference
//! - Multi-turn chat at /chat
//! - Health checks at / and /health

use anyhow::Result;
use axum::{response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

pub mod middleware;
pub mod routes;
pub mod state;

use state::AppState;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Clone config for middleware
    let cors_config = state.config.cors.clone();
    let timeout_duration = Duration::from_secs(state.config.server.request_timeout_secs);

    let mut app = Router::new()
        // Health check endpoint
        .route("/", get(health_check))
        .route("/health", get(health_check))
        // Request metrics
        .route("/metrics", get(metrics))
        // Serving routes
        .merge(routes::serving::create_router())
        // Add middleware (order matters: timeout should be before state)
        .layer(TimeoutLayer::new(timeout_duration))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .with_state(state);

    // Add CORS middleware if enabled (should be outermost)
    if cors_config.enabled {
        app = app.layer(middleware::cors_layer(&cors_config));
    }

    app
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Request metrics endpoint
async fn metrics(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    Json(state.get_metrics().await)
}

/// Start the HTTP server
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_app(state);

    info!("Starting inference server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve when the process receives a shutdown signal
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, draining connections"),
        Err(e) => {
            warn!("Failed to install shutdown handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
