//! Google Secret Manager client
//!
//! Best-effort lookup used only when a secret is absent from the
//! environment. Talks to the Secret Manager REST API with an access
//! token from the metadata server, so it works on the hosting platform
//! without any vendored SDK. Every failure path degrades to `None`; the
//! caller decides whether that is fatal.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Secret Manager client
#[derive(Clone)]
pub struct SecretClient {
    client: Client,
    project: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    data: String,
}

impl SecretClient {
    /// Create a new client for the given project (if any is configured)
    pub fn new(project: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, project }
    }

    /// Read the latest version of a secret.
    ///
    /// Returns `None` when no project is configured, the metadata server
    /// is unreachable, or the API call fails for any reason.
    pub async fn access_secret(&self, secret_id: &str) -> Option<String> {
        let project = match &self.project {
            Some(project) => project,
            None => {
                info!(secret = %secret_id, "Secret Manager not used: no project configured");
                return None;
            }
        };

        match self.fetch(project, secret_id).await {
            Ok(value) => Some(value),
            Err(e) => {
                info!(secret = %secret_id, error = %e, "Secret Manager not used");
                None
            }
        }
    }

    async fn fetch(&self, project: &str, secret_id: &str) -> anyhow::Result<String> {
        let token: TokenResponse = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let url = format!(
            "https://secretmanager.googleapis.com/v1/projects/{}/secrets/{}/versions/latest:access",
            project, secret_id
        );

        let version: SecretVersionResponse = self
            .client
            .get(&url)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let bytes = general_purpose::STANDARD.decode(&version.payload.data)?;
        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_project_yields_none() {
        let client = SecretClient::new(None);
        assert_eq!(client.access_secret("OPENAI_API_KEY").await, None);
    }
}
