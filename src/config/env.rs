//! Environment variable configuration loading

use std::env;

use thiserror::Error;
use tracing::info;

use crate::infra::secrets::SecretClient;

/// Configuration error, fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing OPENAI_API_KEY in env or Secret Manager")]
    MissingOpenAiKey,
}

/// Environment configuration
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// Listening port
    pub port: u16,
    /// OpenAI API key (env var or Secret Manager fallback)
    pub openai_api_key: String,
    /// OpenAI Realtime WebSocket URL
    pub realtime_url: String,
    /// Assistant instructions sent in session.update
    pub system_message: String,
    /// Preferred stable public host for the media WebSocket URL
    pub ws_host: Option<String>,
    /// Fallback public host (managed hosting service URL)
    pub cloud_run_host: Option<String>,
}

/// Load configuration from environment variables.
///
/// `OPENAI_API_KEY` is the one required value: when absent from the
/// environment it is looked up in Secret Manager, and startup fails if
/// neither source provides it.
pub async fn load() -> Result<EnvConfig, ConfigError> {
    let openai_api_key = match non_empty_var("OPENAI_API_KEY") {
        Some(key) => key,
        None => {
            let project = load_with_fallback("GOOGLE_CLOUD_PROJECT", "PROJECT_ID");
            SecretClient::new(project)
                .access_secret("OPENAI_API_KEY")
                .await
                .ok_or(ConfigError::MissingOpenAiKey)?
        }
    };

    let config = EnvConfig {
        port: read_port(),
        openai_api_key,
        realtime_url: env::var("OPENAI_REALTIME_URL")
            .unwrap_or_else(|_| constants::DEFAULT_REALTIME_URL.to_string()),
        system_message: env::var("SYSTEM_MESSAGE")
            .unwrap_or_else(|_| constants::DEFAULT_SYSTEM_MESSAGE.to_string()),
        ws_host: non_empty_var("WS_HOST"),
        cloud_run_host: non_empty_var("CLOUD_RUN_SERVICE_URL"),
    };

    info!(
        port = config.port,
        api_key_len = config.openai_api_key.len(),
        realtime_url = %config.realtime_url,
        ws_host = ?config.ws_host,
        cloud_run_host = ?config.cloud_run_host,
        "Loaded configuration"
    );

    Ok(config)
}

/// Listening port from `PORT`, defaulting to the hosting platform
/// contract. Unparsable values fall back to the default.
fn read_port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(constants::DEFAULT_PORT)
}

/// Read an environment variable, treating empty values as unset
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

/// Load an environment variable with a fallback name
fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary).ok().or_else(|| env::var(fallback).ok())
}

/// Constants
pub mod constants {
    /// Default listening port; must match the port advertised to the
    /// hosting platform
    pub const DEFAULT_PORT: u16 = 8080;

    /// Default Realtime endpoint
    pub const DEFAULT_REALTIME_URL: &str =
        "wss://api.openai.com/v1/realtime?model=gpt-realtime&voice=alloy&temperature=0.8";

    /// Default assistant instructions
    pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful and friendly AI phone assistant. \
        Keep responses concise and natural. Interrupt yourself when the caller starts speaking.";

    /// Realtime session model
    pub const REALTIME_MODEL: &str = "gpt-realtime";

    /// Keepalive ping interval towards the Realtime socket (seconds)
    pub const REALTIME_PING_INTERVAL_SECS: u64 = 20;

    /// Mark label attached to each forwarded audio chunk
    pub const RESPONSE_MARK: &str = "responsePart";

    /// Version
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_fallback() {
        env::set_var("TEST_PRIMARY", "primary_value");
        env::set_var("TEST_FALLBACK", "fallback_value");

        assert_eq!(
            load_with_fallback("TEST_PRIMARY", "TEST_FALLBACK"),
            Some("primary_value".to_string())
        );

        env::remove_var("TEST_PRIMARY");
        assert_eq!(
            load_with_fallback("TEST_PRIMARY", "TEST_FALLBACK"),
            Some("fallback_value".to_string())
        );

        env::remove_var("TEST_FALLBACK");
        assert_eq!(load_with_fallback("TEST_PRIMARY", "TEST_FALLBACK"), None);
    }

    #[test]
    fn test_read_port_default_and_invalid() {
        env::remove_var("PORT");
        assert_eq!(read_port(), constants::DEFAULT_PORT);

        env::set_var("PORT", "not-a-port");
        assert_eq!(read_port(), constants::DEFAULT_PORT);

        env::set_var("PORT", "9090");
        assert_eq!(read_port(), 9090);

        env::remove_var("PORT");
    }

    #[test]
    fn test_non_empty_var() {
        env::set_var("TEST_EMPTY_VAR", "");
        assert_eq!(non_empty_var("TEST_EMPTY_VAR"), None);

        env::set_var("TEST_EMPTY_VAR", "value");
        assert_eq!(non_empty_var("TEST_EMPTY_VAR"), Some("value".to_string()));

        env::remove_var("TEST_EMPTY_VAR");
    }
}
