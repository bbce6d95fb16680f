//! Reqmap Common - Shared data model for the request mind-map tool
//!
//! This crate contains the captured-request record, the lifecycle events
//! delivered by the interception facility, and the messaging contract
//! consumed by the UI surfaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Tab identifier as reported by the interception facility.
/// `-1` is used by browsers for traffic not associated with any tab.
pub type TabId = i64;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to deserialize message: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Captured request body. A request carries either structured form data
/// or a decoded text payload, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Form fields, each possibly with multiple values
    Form(BTreeMap<String, Vec<String>>),

    /// UTF-8 decoded raw payload
    Text(String),
}

/// One captured request/response pair's metadata.
///
/// Field names on the wire stay camelCase so that exported JSON matches
/// what the browser-extension era of this tool produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Opaque identifier, unique per network exchange within a session
    pub id: String,

    /// Raw request URL (unparsed)
    pub url: String,

    /// HTTP method (GET, POST, etc.)
    pub method: String,

    /// Initiator origin, or "N/A" when the event carried none
    pub initiator: String,

    /// When the request was first observed
    pub time_stamp: DateTime<Utc>,

    /// Response status code, once a completion event is observed
    pub status_code: Option<u16>,

    /// Request body, when one could be extracted
    pub body: Option<RequestBody>,

    /// Whether the URL is a WebSocket upgrade (ws:// or wss://)
    pub is_web_socket: bool,
}

impl RequestRecord {
    /// Display method for tree labels: `WS` for WebSocket records,
    /// the raw HTTP method otherwise.
    pub fn display_method(&self) -> &str {
        if self.is_web_socket {
            "WS"
        } else {
            &self.method
        }
    }
}

/// Check whether a URL names a WebSocket endpoint by scheme.
pub fn is_websocket_url(url: &str) -> bool {
    url.starts_with("ws:") || url.starts_with("wss:")
}

/// Request body as delivered by the interception facility, before the
/// extraction policy is applied. Raw payloads arrive as byte chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapturedBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<BTreeMap<String, Vec<String>>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw: Vec<Vec<u8>>,
}

/// "Request started" notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestStarted {
    pub request_id: String,
    pub tab_id: TabId,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub initiator: Option<String>,
    pub time_stamp: DateTime<Utc>,
    #[serde(default)]
    pub request_body: Option<CapturedBody>,
}

/// "Request completed" notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCompleted {
    pub request_id: String,
    pub tab_id: TabId,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub initiator: Option<String>,
    pub time_stamp: DateTime<Utc>,
    pub status_code: u16,
}

/// Network lifecycle event. The two notifications may arrive in either
/// order per request id; the capture engine tolerates both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Started(RequestStarted),
    Completed(RequestCompleted),
}

impl LifecycleEvent {
    /// Tab the event belongs to
    pub fn tab_id(&self) -> TabId {
        match self {
            LifecycleEvent::Started(e) => e.tab_id,
            LifecycleEvent::Completed(e) => e.tab_id,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Serialize)
    }

    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(s).map_err(ProtocolError::Deserialize)
    }
}

/// Command sent from a UI surface to the capture engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    StartCapture { tab_id: TabId },
    StopCapture,
    GetStatus,
    GetRequests,
}

/// Capture status as reported by `getStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStatus {
    pub is_capturing: bool,
    pub active_tab_id: Option<TabId>,
}

/// Response to a [`Command`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResponse {
    /// `{"status": "started"}` / `{"status": "stopped"}`
    Ack { status: AckStatus },

    /// `{"isCapturing": ..., "activeTabId": ...}`
    Status(CaptureStatus),

    /// `{"requests": [...]}`
    Requests {
        #[serde(default)]
        requests: Vec<RequestRecord>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Started,
    Stopped,
}
