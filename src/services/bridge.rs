//! Media bridge session
//!
//! One session per call: the Twilio media stream WebSocket on one side,
//! a Realtime session on the other. Caller audio is forwarded as-is
//! (both legs speak base64 PCMU); assistant audio flows back with a mark
//! after every chunk so barge-in can flush unplayed audio.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as OaiMessage;
use tracing::{error, info, warn};

use crate::config::env::constants::{REALTIME_PING_INTERVAL_SECS, RESPONSE_MARK};
use crate::config::EnvConfig;
use crate::domain::realtime::{
    ClientEvent, ServerEvent, INPUT_SPEECH_STARTED, RESPONSE_OUTPUT_AUDIO_DELTA,
};
use crate::domain::twilio::StreamEvent;
use crate::infra::realtime::{self, RealtimeStream};
use crate::state::{AppState, CallInfo};

/// Frames the Realtime pump hands back to the session loop
enum PumpFrame {
    /// One base64 PCMU chunk of assistant audio
    Audio { payload: String },
    /// The caller started speaking over the assistant
    BargeIn { item_id: Option<String> },
}

/// An open Realtime leg: the write half plus the pump reading the other
struct RealtimeLink {
    sink: SplitSink<RealtimeStream, OaiMessage>,
    pump: JoinHandle<()>,
}

/// Handle one media stream connection
pub async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    info!("Media stream socket accepted");

    if let Err(e) = run_session(socket, state).await {
        error!(error = %e, "Bridge session error");
    }

    info!("Media stream closed");
}

/// Run the session until the stream stops or either leg fails
async fn run_session(socket: WebSocket, state: Arc<AppState>) -> anyhow::Result<()> {
    let (mut twilio_tx, mut twilio_rx) = socket.split();

    // Twilio sends `connected` as soon as the stream opens.
    let hello: StreamEvent = match twilio_rx.next().await {
        Some(Ok(WsMessage::Text(text))) => {
            serde_json::from_str(&text).unwrap_or(StreamEvent::Unknown)
        }
        Some(Ok(WsMessage::Close(_))) | None => {
            info!("Twilio disconnected before first frame");
            return Ok(());
        }
        Some(Ok(_)) => StreamEvent::Unknown,
        Some(Err(e)) => return Err(e.into()),
    };

    info!(event = hello.name(), "Twilio first event");

    // Acknowledge the handshake with our media format.
    if matches!(hello, StreamEvent::Connected { .. }) {
        send_frame(&mut twilio_tx, &StreamEvent::connected_ack()).await?;
        info!("Sent connected ACK (mu-law, 8 kHz, mono)");
    }

    let mut stream_sid: Option<String> = None;
    let mut mark_queue: VecDeque<String> = VecDeque::new();
    let mut link: Option<RealtimeLink> = None;

    let (pump_tx, mut pump_rx) = mpsc::channel::<PumpFrame>(256);
    let mut ping_interval =
        tokio::time::interval(Duration::from_secs(REALTIME_PING_INTERVAL_SECS));

    // The first frame may already be `start`; run it through the same
    // handling as everything read off the socket afterwards.
    let mut pending = Some(hello);

    'session: loop {
        let event: Option<StreamEvent> = if let Some(event) = pending.take() {
            Some(event)
        } else {
            tokio::select! {
                // Frames from Twilio
                msg = twilio_rx.next() => match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<StreamEvent>(&text) {
                            Ok(event) => Some(event),
                            Err(e) => {
                                warn!(error = %e, "Failed to parse stream frame");
                                None
                            }
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = twilio_tx.send(WsMessage::Pong(data)).await;
                        None
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        info!("Twilio disconnected");
                        break 'session;
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        info!(error = %e, "WS receive error");
                        break 'session;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        break 'session;
                    }
                },

                // Frames from the Realtime pump
                Some(frame) = pump_rx.recv() => {
                    match frame {
                        PumpFrame::Audio { payload } => {
                            if let Some(sid) = stream_sid.as_deref() {
                                if let Err(e) =
                                    send_frame(&mut twilio_tx, &StreamEvent::media(sid, payload)).await
                                {
                                    error!(error = %e, "Failed to forward audio to Twilio");
                                    break 'session;
                                }
                                if send_frame(&mut twilio_tx, &StreamEvent::mark(sid, RESPONSE_MARK))
                                    .await
                                    .is_ok()
                                {
                                    mark_queue.push_back(RESPONSE_MARK.to_string());
                                }
                            }
                        }
                        PumpFrame::BargeIn { item_id } => {
                            if let (Some(l), Some(item)) = (link.as_mut(), item_id) {
                                info!(item_id = %item, "Barge-in: truncating assistant item");
                                if let Err(e) =
                                    send_event(&mut l.sink, &ClientEvent::truncate_item(item)).await
                                {
                                    warn!(error = %e, "Barge-in truncate failed");
                                }
                            }
                            if let Some(sid) = stream_sid.as_deref() {
                                if let Err(e) =
                                    send_frame(&mut twilio_tx, &StreamEvent::clear(sid)).await
                                {
                                    warn!(error = %e, "Barge-in clear failed");
                                }
                                mark_queue.clear();
                            }
                        }
                    }
                    None
                }

                // Keepalive towards the Realtime socket
                _ = ping_interval.tick() => {
                    if let Some(l) = link.as_mut() {
                        if let Err(e) = l.sink.send(OaiMessage::Ping(Vec::new())).await {
                            error!(error = %e, "Failed to ping realtime socket");
                            break 'session;
                        }
                    }
                    None
                }
            }
        };

        let Some(event) = event else { continue };

        match event {
            StreamEvent::Start {
                start,
                stream_sid: top_sid,
            } => {
                let sid = start.stream_sid.clone().or(top_sid);
                info!(stream_sid = ?sid, call_sid = ?start.call_sid, "Twilio stream start");

                if let Some(sid) = &sid {
                    state
                        .calls
                        .add(CallInfo::new(sid.clone(), start.call_sid.clone()))
                        .await;
                }
                stream_sid = sid;

                if link.is_none() {
                    match open_realtime(&state.config, pump_tx.clone()).await {
                        Ok(l) => link = Some(l),
                        Err(e) => {
                            error!(error = %e, "Failed to open realtime session");
                            break 'session;
                        }
                    }
                }
            }

            StreamEvent::Media { media, .. } => {
                // A `media` frame before `start` still opens the session.
                if link.is_none() {
                    match open_realtime(&state.config, pump_tx.clone()).await {
                        Ok(l) => link = Some(l),
                        Err(e) => {
                            error!(error = %e, "Failed to open realtime session");
                            break 'session;
                        }
                    }
                }
                if let Some(l) = link.as_mut() {
                    if let Err(e) =
                        send_event(&mut l.sink, &ClientEvent::append_audio(media.payload)).await
                    {
                        error!(error = %e, "Failed to forward audio to realtime");
                        break 'session;
                    }
                }
            }

            StreamEvent::Mark { .. } => {
                mark_queue.pop_front();
            }

            StreamEvent::Stop => {
                info!("Twilio stream stop");
                break 'session;
            }

            // `connected`, `clear` or anything unrecognized
            _ => {}
        }
    }

    // Teardown: both legs closed, call unregistered, no matter how the
    // loop ended.
    if let Some(l) = link.take() {
        close_realtime(l).await;
    }
    if let Some(sid) = stream_sid.take() {
        state.calls.remove(&sid).await;
    }
    let _ = twilio_tx.close().await;

    Ok(())
}

/// Dial the Realtime endpoint, configure the session and start the pump
async fn open_realtime(
    config: &EnvConfig,
    pump_tx: mpsc::Sender<PumpFrame>,
) -> anyhow::Result<RealtimeLink> {
    let ws = realtime::connect(&config.realtime_url, &config.openai_api_key).await?;
    let (mut sink, stream) = ws.split();

    send_event(&mut sink, &ClientEvent::session_update(&config.system_message)).await?;
    info!("Sent realtime session.update");

    let pump = tokio::spawn(pump_realtime(stream, pump_tx));

    Ok(RealtimeLink { sink, pump })
}

/// Close the Realtime leg and stop its pump
async fn close_realtime(mut link: RealtimeLink) {
    let _ = link.sink.send(OaiMessage::Close(None)).await;
    link.pump.abort();
}

/// Read Realtime server events, forwarding assistant audio and barge-in
/// signals to the session loop.
async fn pump_realtime(mut stream: SplitStream<RealtimeStream>, out: mpsc::Sender<PumpFrame>) {
    let mut last_item: Option<String> = None;

    while let Some(msg) = stream.next().await {
        let text = match msg {
            Ok(OaiMessage::Text(text)) => text,
            Ok(OaiMessage::Close(_)) => {
                info!("Realtime socket closed");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Realtime pump error");
                break;
            }
        };

        let event: ServerEvent = match serde_json::from_str(&text) {
            Ok(event) => event,
            Err(_) => continue,
        };

        if event.is_loggable() {
            info!(kind = %event.kind, "Realtime event");
        }

        match event.kind.as_str() {
            RESPONSE_OUTPUT_AUDIO_DELTA => {
                let Some(delta) = event.delta else { continue };

                if let Some(item) = event.item_id {
                    if last_item.as_deref() != Some(item.as_str()) {
                        last_item = Some(item);
                    }
                }
                if out.send(PumpFrame::Audio { payload: delta }).await.is_err() {
                    break;
                }
            }
            INPUT_SPEECH_STARTED => {
                if out
                    .send(PumpFrame::BargeIn {
                        item_id: last_item.take(),
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            _ => {}
        }
    }
}

/// Serialize and send one frame to the Twilio socket
async fn send_frame(
    sink: &mut SplitSink<WebSocket, WsMessage>,
    frame: &StreamEvent,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(frame)?;
    sink.send(WsMessage::Text(json.into())).await?;
    Ok(())
}

/// Serialize and send one event to the Realtime socket
async fn send_event(
    sink: &mut SplitSink<RealtimeStream, OaiMessage>,
    event: &ClientEvent,
) -> anyhow::Result<()> {
    let json = serde_json::to_string(event)?;
    sink.send(OaiMessage::Text(json)).await?;
    Ok(())
}
