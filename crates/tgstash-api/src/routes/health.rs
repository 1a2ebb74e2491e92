//! Health check endpoint for load balancers and uptime monitors.

use axum::{Json, Router, extract::State, routing::any};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Serialize)]
struct PingResponse {
    ok: bool,
    /// Server time, epoch milliseconds.
    ts: i64,
    telemetry_disabled: bool,
}

/// Health check router. Answers any method and is never gated.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/ping", any(ping))
}

async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        ts: chrono::Utc::now().timestamp_millis(),
        telemetry_disabled: state.config.telemetry_disabled(),
    })
}
