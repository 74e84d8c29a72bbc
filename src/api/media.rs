//! Media stream WebSocket endpoint

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::services::bridge;
use crate::state::AppState;

/// Create media stream routes
///
/// `/stream` is a legacy alias; some Twilio configurations still point
/// at it.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media-stream", get(media_stream_handler))
        .route("/stream", get(media_stream_handler))
}

/// WebSocket upgrade into a bridge session
///
/// GET /media-stream, GET /stream
async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("Media stream upgrade requested");
    ws.on_upgrade(move |socket| bridge::handle_connection(socket, state))
}
