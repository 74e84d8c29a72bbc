//! Health and liveness API
//!
//! Contains the / and /_ping endpoints

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::config::env::constants::VERSION;
use crate::state::calls::CallSummary;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    active_calls: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    calls: Vec<CallSummary>,
}

/// Create health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/_ping", get(ping))
}

/// Health check - status, version and bridged call count
///
/// GET /
/// No authentication
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let calls = state.calls.snapshot().await;

    Json(HealthResponse {
        status: "ok",
        service: "voice-bridge",
        version: VERSION,
        timestamp: chrono::Utc::now().to_rfc3339(),
        active_calls: calls.len(),
        calls,
    })
}

/// Plaintext probe, handy to confirm public access is configured
///
/// GET /_ping
async fn ping() -> &'static str {
    "pong"
}
