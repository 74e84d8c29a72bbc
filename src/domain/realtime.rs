//! OpenAI Realtime wire protocol
//!
//! Client events are fully typed since the bridge builds them; server
//! events arrive as a loose envelope because only a handful of fields
//! are ever read (`type`, `delta`, `item_id`).

use serde::{Deserialize, Serialize};

use crate::config::env::constants::REALTIME_MODEL;

/// Server event carrying an assistant audio chunk
pub const RESPONSE_OUTPUT_AUDIO_DELTA: &str = "response.output_audio.delta";

/// Server event signalling the caller started speaking (barge-in)
pub const INPUT_SPEECH_STARTED: &str = "input_audio_buffer.speech_started";

/// Server events worth an info log line
const LOG_EVENT_TYPES: &[&str] = &[
    "error",
    "response.content.done",
    "response.done",
    "rate_limits.updated",
    "input_audio_buffer.committed",
    "input_audio_buffer.speech_started",
    "input_audio_buffer.speech_stopped",
    "session.created",
    "session.updated",
];

/// Event sent by the bridge to the Realtime socket
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },
    #[serde(rename = "input_audio_buffer.append")]
    AppendAudio { audio: String },
    #[serde(rename = "conversation.item.truncate")]
    TruncateItem { item_id: String, content_index: u32 },
}

impl ClientEvent {
    /// Session configuration: PCMU in and out, server-side voice activity
    /// detection, audio-only responses.
    pub fn session_update(instructions: &str) -> Self {
        ClientEvent::SessionUpdate {
            session: SessionConfig {
                kind: "realtime",
                model: REALTIME_MODEL,
                instructions: instructions.to_string(),
                output_modalities: vec!["audio"],
                audio: AudioConfig {
                    input: AudioInput {
                        format: AudioFormat { kind: "audio/pcmu" },
                        turn_detection: TurnDetection { kind: "server_vad" },
                    },
                    output: AudioOutput {
                        format: AudioFormat { kind: "audio/pcmu" },
                    },
                },
            },
        }
    }

    /// Forward one base64 mu-law chunk from the caller
    pub fn append_audio(payload: String) -> Self {
        ClientEvent::AppendAudio { audio: payload }
    }

    /// Cut off a partially spoken assistant item
    pub fn truncate_item(item_id: String) -> Self {
        ClientEvent::TruncateItem {
            item_id,
            content_index: 0,
        }
    }
}

/// `session.update` payload
#[derive(Clone, Debug, Serialize)]
pub struct SessionConfig {
    #[serde(rename = "type")]
    kind: &'static str,
    model: &'static str,
    instructions: String,
    output_modalities: Vec<&'static str>,
    audio: AudioConfig,
}

#[derive(Clone, Debug, Serialize)]
struct AudioConfig {
    input: AudioInput,
    output: AudioOutput,
}

#[derive(Clone, Debug, Serialize)]
struct AudioInput {
    format: AudioFormat,
    turn_detection: TurnDetection,
}

#[derive(Clone, Debug, Serialize)]
struct AudioOutput {
    format: AudioFormat,
}

#[derive(Clone, Debug, Serialize)]
struct AudioFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Clone, Debug, Serialize)]
struct TurnDetection {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Loose envelope for events received from the Realtime socket
#[derive(Clone, Debug, Deserialize)]
pub struct ServerEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub delta: Option<String>,
    pub item_id: Option<String>,
}

impl ServerEvent {
    /// Whether this event type belongs in the log
    pub fn is_loggable(&self) -> bool {
        LOG_EVENT_TYPES.contains(&self.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_update_shape() {
        let event = ClientEvent::session_update("Be brief.");
        let json = serde_json::to_value(&event).expect("serialize session.update");

        assert_eq!(json["type"], "session.update");
        assert_eq!(json["session"]["type"], "realtime");
        assert_eq!(json["session"]["model"], "gpt-realtime");
        assert_eq!(json["session"]["instructions"], "Be brief.");
        assert_eq!(json["session"]["output_modalities"][0], "audio");
        assert_eq!(json["session"]["audio"]["input"]["format"]["type"], "audio/pcmu");
        assert_eq!(
            json["session"]["audio"]["input"]["turn_detection"]["type"],
            "server_vad"
        );
        assert_eq!(json["session"]["audio"]["output"]["format"]["type"], "audio/pcmu");
    }

    #[test]
    fn test_append_audio_shape() {
        let json = serde_json::to_value(ClientEvent::append_audio("fn9+".into()))
            .expect("serialize append");
        assert_eq!(json["type"], "input_audio_buffer.append");
        assert_eq!(json["audio"], "fn9+");
    }

    #[test]
    fn test_truncate_shape() {
        let json = serde_json::to_value(ClientEvent::truncate_item("item_1".into()))
            .expect("serialize truncate");
        assert_eq!(json["type"], "conversation.item.truncate");
        assert_eq!(json["item_id"], "item_1");
        assert_eq!(json["content_index"], 0);
    }

    #[test]
    fn test_server_event_parse() {
        let json = r#"{"type":"response.output_audio.delta","item_id":"item_1","delta":"fn9+","extra":true}"#;
        let event: ServerEvent = serde_json::from_str(json).expect("parse server event");
        assert_eq!(event.kind, RESPONSE_OUTPUT_AUDIO_DELTA);
        assert_eq!(event.delta.as_deref(), Some("fn9+"));
        assert_eq!(event.item_id.as_deref(), Some("item_1"));
        assert!(!event.is_loggable());
    }

    #[test]
    fn test_loggable_set() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"session.created"}"#).expect("parse");
        assert!(event.is_loggable());
    }
}
