//! Application state

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::EnvConfig;

use super::calls::CallRegistry;

/// Global shutdown token for stopping the server and per-call tasks
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// Get the global shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN.get_or_init(CancellationToken::new).clone()
}

/// Trigger global shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

/// Application state
pub struct AppState {
    /// Environment configuration
    pub config: EnvConfig,
    /// Service start time
    pub started_at: DateTime<Utc>,
    /// Calls currently bridged
    pub calls: CallRegistry,
}

impl AppState {
    /// Create new application state
    pub fn new(config: EnvConfig) -> Self {
        Self {
            config,
            started_at: Utc::now(),
            calls: CallRegistry::new(),
        }
    }
}
