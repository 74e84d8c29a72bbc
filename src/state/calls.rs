//! Active call registry
//!
//! Tracks media streams currently bridged to a Realtime session, keyed
//! by Twilio stream SID. Surfaced by the health endpoint.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// One bridged call
#[derive(Clone, Debug)]
pub struct CallInfo {
    /// Twilio media stream SID
    pub stream_sid: String,
    /// Twilio call SID, when the start frame carried one
    pub call_sid: Option<String>,
    /// When the media stream started
    pub connected_at: DateTime<Utc>,
}

impl CallInfo {
    pub fn new(stream_sid: String, call_sid: Option<String>) -> Self {
        Self {
            stream_sid,
            call_sid,
            connected_at: Utc::now(),
        }
    }
}

/// Call summary for API responses
#[derive(Clone, Debug, Serialize)]
pub struct CallSummary {
    pub stream_sid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
    pub connected_at: String,
}

/// Registry of calls currently bridged
pub struct CallRegistry {
    calls: RwLock<HashMap<String, CallInfo>>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self {
            calls: RwLock::new(HashMap::new()),
        }
    }

    /// Register a call
    pub async fn add(&self, call: CallInfo) {
        let mut calls = self.calls.write().await;
        calls.insert(call.stream_sid.clone(), call);
    }

    /// Remove a call, returning its info if it was registered
    pub async fn remove(&self, stream_sid: &str) -> Option<CallInfo> {
        let mut calls = self.calls.write().await;
        calls.remove(stream_sid)
    }

    /// Number of calls currently bridged
    pub async fn count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Snapshot for API responses
    pub async fn snapshot(&self) -> Vec<CallSummary> {
        let calls = self.calls.read().await;
        calls
            .values()
            .map(|call| CallSummary {
                stream_sid: call.stream_sid.clone(),
                call_sid: call.call_sid.clone(),
                connected_at: call.connected_at.to_rfc3339(),
            })
            .collect()
    }
}

impl Default for CallRegistry {
    fn default() -> Self {
        Self::new()
    }
}
