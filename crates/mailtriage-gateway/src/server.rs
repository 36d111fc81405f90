// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::{get, post},
};
use mailtriage_agent::WorkerSupervisor;
use mailtriage_config::model::GatewayConfig;
use mailtriage_core::TriageError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub supervisor: Arc<WorkerSupervisor>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
    pub bot_version: String,
}

impl GatewayState {
    pub fn new(supervisor: Arc<WorkerSupervisor>, bot_version: impl Into<String>) -> Self {
        Self {
            supervisor,
            start_time: Instant::now(),
            bot_version: bot_version.into(),
        }
    }
}

/// Builds the route table:
/// - GET /health
/// - POST /api/start
/// - POST /api/stop
/// - GET /api/dashboard-data
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/start", post(handlers::post_start))
        .route("/api/stop", post(handlers::post_stop))
        .route("/api/dashboard-data", get(handlers::get_dashboard_data))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Binds to the configured address and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &GatewayConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), TriageError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TriageError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| TriageError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
