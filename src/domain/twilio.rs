//! Twilio Media Streams wire protocol
//!
//! JSON frames exchanged over the `/media-stream` WebSocket, tagged by
//! the `event` field. The same enum covers both directions: inbound
//! lifecycle frames from Twilio and outbound audio/mark/clear frames.

use serde::{Deserialize, Serialize};

/// Audio format advertised in the `connected` acknowledgement and echoed
/// by Twilio in the `start` frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MediaFormat {
    pub encoding: String,
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
    pub channels: u32,
}

impl MediaFormat {
    /// G.711 mu-law, 8 kHz, mono - the only format the bridge speaks
    pub fn ulaw_8k() -> Self {
        Self {
            encoding: "audio/x-mulaw".to_string(),
            sample_rate: 8000,
            channels: 1,
        }
    }
}

/// Metadata carried by the `start` frame
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartMeta {
    #[serde(rename = "streamSid")]
    pub stream_sid: Option<String>,
    #[serde(rename = "callSid", skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
    #[serde(rename = "accountSid", skip_serializing_if = "Option::is_none")]
    pub account_sid: Option<String>,
    #[serde(rename = "mediaFormat", skip_serializing_if = "Option::is_none")]
    pub media_format: Option<MediaFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<String>>,
}

/// Payload of a `media` frame; base64 mu-law audio
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub payload: String,
}

/// Name attached to a `mark` frame
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkPayload {
    pub name: String,
}

/// Media stream frame
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Handshake frame. Inbound it opens the stream; outbound it carries
    /// the format acknowledgement.
    Connected {
        #[serde(rename = "mediaFormat", skip_serializing_if = "Option::is_none")]
        media_format: Option<MediaFormat>,
    },
    /// Stream start with call metadata
    Start {
        start: StartMeta,
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
    },
    /// Audio chunk
    Media {
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
        media: MediaPayload,
    },
    /// Playback checkpoint acknowledgement
    Mark {
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
        mark: MarkPayload,
    },
    /// Stream end
    Stop,
    /// Flush buffered outbound audio
    Clear {
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
    },
    /// Any event the bridge does not act on
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Format acknowledgement sent in reply to Twilio's `connected` frame
    pub fn connected_ack() -> Self {
        StreamEvent::Connected {
            media_format: Some(MediaFormat::ulaw_8k()),
        }
    }

    /// Outbound audio chunk for the given stream
    pub fn media(stream_sid: &str, payload: String) -> Self {
        StreamEvent::Media {
            stream_sid: Some(stream_sid.to_string()),
            media: MediaPayload {
                track: None,
                chunk: None,
                timestamp: None,
                payload,
            },
        }
    }

    /// Outbound mark for the given stream
    pub fn mark(stream_sid: &str, name: &str) -> Self {
        StreamEvent::Mark {
            stream_sid: Some(stream_sid.to_string()),
            mark: MarkPayload {
                name: name.to_string(),
            },
        }
    }

    /// Outbound clear for the given stream
    pub fn clear(stream_sid: &str) -> Self {
        StreamEvent::Clear {
            stream_sid: Some(stream_sid.to_string()),
        }
    }

    /// Short event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Connected { .. } => "connected",
            StreamEvent::Start { .. } => "start",
            StreamEvent::Media { .. } => "media",
            StreamEvent::Mark { .. } => "mark",
            StreamEvent::Stop => "stop",
            StreamEvent::Clear { .. } => "clear",
            StreamEvent::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_frame() {
        let json = r#"{
            "event": "start",
            "sequenceNumber": "1",
            "start": {
                "streamSid": "MZXXXX",
                "accountSid": "ACXXXX",
                "callSid": "CAXXXX",
                "tracks": ["inbound"],
                "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
            },
            "streamSid": "MZXXXX"
        }"#;

        let event: StreamEvent = serde_json::from_str(json).expect("parse start");
        match event {
            StreamEvent::Start { start, .. } => {
                assert_eq!(start.stream_sid.as_deref(), Some("MZXXXX"));
                assert_eq!(start.call_sid.as_deref(), Some("CAXXXX"));
                assert_eq!(start.media_format, Some(MediaFormat::ulaw_8k()));
            }
            other => panic!("expected start, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_media_frame() {
        let json = r#"{
            "event": "media",
            "streamSid": "MZXXXX",
            "media": {"track": "inbound", "chunk": "2", "timestamp": "40", "payload": "fn9+"}
        }"#;

        let event: StreamEvent = serde_json::from_str(json).expect("parse media");
        match event {
            StreamEvent::Media { media, .. } => assert_eq!(media.payload, "fn9+"),
            other => panic!("expected media, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_is_tolerated() {
        let json = r#"{"event": "dtmf", "dtmf": {"digit": "1"}}"#;
        let event: StreamEvent = serde_json::from_str(json).expect("parse unknown");
        assert!(matches!(event, StreamEvent::Unknown));
    }

    #[test]
    fn test_serialize_outbound_mark() {
        let frame = StreamEvent::mark("MZXXXX", "responsePart");
        let json = serde_json::to_value(&frame).expect("serialize mark");
        assert_eq!(json["event"], "mark");
        assert_eq!(json["streamSid"], "MZXXXX");
        assert_eq!(json["mark"]["name"], "responsePart");
    }

    #[test]
    fn test_serialize_connected_ack() {
        let json = serde_json::to_value(StreamEvent::connected_ack()).expect("serialize ack");
        assert_eq!(json["event"], "connected");
        assert_eq!(json["mediaFormat"]["encoding"], "audio/x-mulaw");
        assert_eq!(json["mediaFormat"]["sampleRate"], 8000);
        assert_eq!(json["mediaFormat"]["channels"], 1);
    }

    #[test]
    fn test_serialize_clear_omits_empty_fields() {
        let text = serde_json::to_string(&StreamEvent::clear("MZXXXX")).expect("serialize clear");
        assert_eq!(text, r#"{"event":"clear","streamSid":"MZXXXX"}"#);
    }
}
