//! Outbound Realtime WebSocket connection

use anyhow::Context;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::info;

/// Connected Realtime socket
pub type RealtimeStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Dial the Realtime endpoint with bearer authentication.
///
/// The upgrade request is built by hand because the extra `Authorization`
/// header has to survive into the handshake.
pub async fn connect(realtime_url: &str, api_key: &str) -> anyhow::Result<RealtimeStream> {
    let url = url::Url::parse(realtime_url).context("invalid realtime URL")?;
    let host = url.host_str().unwrap_or("api.openai.com");

    let request = tokio_tungstenite::tungstenite::http::Request::builder()
        .uri(realtime_url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Host", host)
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Sec-WebSocket-Version", "13")
        .header(
            "Sec-WebSocket-Key",
            tokio_tungstenite::tungstenite::handshake::client::generate_key(),
        )
        .body(())
        .context("failed to build realtime upgrade request")?;

    info!(host = %host, "Connecting to realtime endpoint");

    let (ws_stream, _) = connect_async(request)
        .await
        .context("realtime connect failed")?;

    Ok(ws_stream)
}
