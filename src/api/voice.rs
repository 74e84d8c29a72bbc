//! Twilio webhook API
//!
//! Contains the /twilio/voice and /stream-status endpoints

use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::config::EnvConfig;
use crate::domain::{Locale, VoiceResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Fields read from the Twilio voice webhook form
#[derive(Debug, Deserialize, Default)]
struct VoiceWebhookForm {
    #[serde(rename = "From")]
    from: Option<String>,
    #[serde(rename = "CallSid")]
    call_sid: Option<String>,
}

/// Create webhook routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/twilio/voice", get(twilio_voice).post(twilio_voice))
        .route("/stream-status", post(stream_status))
}

/// Voice webhook - answers an inbound call with TwiML that greets the
/// caller in their language and connects the call's media stream to
/// this service.
///
/// GET|POST /twilio/voice
async fn twilio_voice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<VoiceWebhookForm>, FormRejection>,
) -> ApiResult<Response> {
    let form = form.map(|Form(f)| f).unwrap_or_default();

    let http_host = request_host(&headers);
    let ws_host = media_host(&state.config, &http_host);
    if ws_host.is_empty() {
        return Err(ApiError::internal(
            "no public host available for the media stream URL",
        ));
    }

    let ws_url = format!("wss://{}/media-stream", ws_host);
    let status_cb = format!("https://{}/stream-status", http_host);

    let caller = form.from.as_deref().map(str::trim).unwrap_or("");
    let locale = Locale::for_caller(Some(caller));

    let xml = VoiceResponse::new()
        .say(locale.intro(), "alice", locale.tag())
        .pause(1)
        .say(locale.ready(), "alice", locale.tag())
        .connect_stream(&ws_url, &status_cb, "POST")
        .to_xml();

    info!(
        ws_url = %ws_url,
        status_cb = %status_cb,
        caller = %caller,
        call_sid = ?form.call_sid,
        lang = locale.tag(),
        "Answered voice webhook"
    );

    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}

/// Stream lifecycle callback: start, mark, media, stop, errors.
/// Logged and acknowledged, nothing else.
///
/// POST /stream-status
async fn stream_status(body: Bytes) -> impl IntoResponse {
    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(&body)
        .into_owned()
        .collect();

    if pairs.is_empty() {
        info!(raw = %String::from_utf8_lossy(&body), "Stream status callback");
    } else {
        info!(payload = ?pairs, "Stream status callback");
    }

    Json(serde_json::json!({ "ok": true }))
}

/// Host the request arrived on, scheme stripped.
///
/// Prefers `X-Forwarded-Host` (what the platform's proxy saw), falling
/// back to the plain `Host` header.
fn request_host(headers: &HeaderMap) -> String {
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    strip_scheme(host)
}

/// Host to advertise for the media WebSocket.
///
/// A configured stable host wins over whatever host this request used,
/// because webhook traffic may arrive via an ephemeral deployment URL.
fn media_host(config: &EnvConfig, http_host: &str) -> String {
    let host = config
        .ws_host
        .as_deref()
        .or(config.cloud_run_host.as_deref())
        .unwrap_or(http_host);
    strip_scheme(host)
}

fn strip_scheme(host: &str) -> String {
    host.replace("https://", "").replace("http://", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(ws_host: Option<&str>, cloud_run_host: Option<&str>) -> EnvConfig {
        EnvConfig {
            port: 8080,
            openai_api_key: "sk-test".to_string(),
            realtime_url: "wss://example.invalid/v1/realtime".to_string(),
            system_message: "Be brief.".to_string(),
            ws_host: ws_host.map(str::to_string),
            cloud_run_host: cloud_run_host.map(str::to_string),
        }
    }

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("https://bridge.a.run.app"), "bridge.a.run.app");
        assert_eq!(strip_scheme(" bridge.a.run.app "), "bridge.a.run.app");
        assert_eq!(strip_scheme("bridge.a.run.app"), "bridge.a.run.app");
    }

    #[test]
    fn test_request_host_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:8080"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static("bridge.a.run.app"),
        );
        assert_eq!(request_host(&headers), "bridge.a.run.app");
    }

    #[test]
    fn test_request_host_falls_back_to_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("bridge.a.run.app"));
        assert_eq!(request_host(&headers), "bridge.a.run.app");
    }

    #[test]
    fn test_media_host_precedence() {
        let cfg = config(Some("stable.a.run.app"), Some("https://other.a.run.app"));
        assert_eq!(media_host(&cfg, "req.a.run.app"), "stable.a.run.app");

        let cfg = config(None, Some("https://other.a.run.app"));
        assert_eq!(media_host(&cfg, "req.a.run.app"), "other.a.run.app");

        let cfg = config(None, None);
        assert_eq!(media_host(&cfg, "req.a.run.app"), "req.a.run.app");

        let cfg = config(None, None);
        assert_eq!(media_host(&cfg, ""), "");
    }
}
