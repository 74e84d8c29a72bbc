//! API module
//!
//! HTTP handlers and route assembly

pub mod health;
pub mod media;
pub mod voice;

use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the complete API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health & probes
        .merge(health::router())
        // Twilio webhooks
        .merge(voice::router())
        // Media stream WebSocket
        .merge(media::router())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
