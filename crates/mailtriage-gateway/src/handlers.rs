// SPDX-FileCopyrightText: 2026 Mailtriage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the control API.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mailtriage_agent::{ControlError, WorkerSnapshot};
use serde::Serialize;
use tracing::info;

use crate::server::GatewayState;

/// Response body for the start and stop controls.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// "success" or "error".
    pub status: &'static str,
    pub message: String,
}

impl ControlResponse {
    fn success(message: &str) -> Response {
        (
            StatusCode::OK,
            Json(ControlResponse {
                status: "success",
                message: message.to_string(),
            }),
        )
            .into_response()
    }

    fn rejected(err: ControlError) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ControlResponse {
                status: "error",
                message: err.to_string(),
            }),
        )
            .into_response()
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: u64,
    pub bot_status: String,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: state.bot_version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        bot_status: state.supervisor.snapshot().bot_status.to_string(),
    })
}

/// POST /api/start
pub async fn post_start(State(state): State<GatewayState>) -> Response {
    match state.supervisor.start().await {
        Ok(()) => {
            info!("start requested via control API");
            ControlResponse::success("Bot started.")
        }
        Err(e) => ControlResponse::rejected(e),
    }
}

/// POST /api/stop
///
/// Returns once the worker has finished its current batch.
pub async fn post_stop(State(state): State<GatewayState>) -> Response {
    match state.supervisor.stop().await {
        Ok(()) => {
            info!("stop requested via control API");
            ControlResponse::success("Bot stopped.")
        }
        Err(e) => ControlResponse::rejected(e),
    }
}

/// GET /api/dashboard-data
pub async fn get_dashboard_data(State(state): State<GatewayState>) -> Json<WorkerSnapshot> {
    Json(state.supervisor.snapshot().for_dashboard())
}
