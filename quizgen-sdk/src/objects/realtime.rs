//! Realtime channel message types.
//!
//! The browser holds one socket to the realtime fabric using the
//! `json.webpubsub.azure.v1` subprotocol. The fabric wraps everything the
//! backend publishes in a frame:
//!
//! ```json
//! {"type":"message","from":"server","dataType":"json","data":{"type":"quiz_processed","quiz_id":"…"}}
//! {"type":"system","event":"connected","userId":"…","connectionId":"…"}
//! ```
//!
//! Only the `data` object matters to the client. It is parsed once, here,
//! into [`RealtimeEvent`].

use serde::{Deserialize, Serialize};

/// Subprotocol requested when opening the realtime socket.
pub const WEBPUBSUB_SUBPROTOCOL: &str = "json.webpubsub.azure.v1";

/// Event published to a user once one of their creation jobs finished.
///
/// Internally tagged on `"type"`; tags this client does not know decode to
/// [`RealtimeEvent::Unrecognized`] so that new event kinds never break older
/// clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    /// A quiz finished generating.
    QuizProcessed {
        /// Not every publisher includes the id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quiz_id: Option<String>,
    },
    /// A quiz failed to generate.
    QuizErrored {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quiz_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

/// Why a frame could not be turned into an event.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not valid json: {0}")]
    Json(#[source] serde_json::Error),
    #[error("frame data is not an event: {0}")]
    Event(#[source] serde_json::Error),
}

#[derive(Deserialize)]
struct ServerFrame {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Parse one text frame received from the fabric.
///
/// Returns `Ok(None)` for frames that carry no `data` (system frames such as
/// `connected`), which are not events.
pub fn parse_frame(text: &str) -> Result<Option<RealtimeEvent>, FrameError> {
    let frame: ServerFrame = serde_json::from_str(text).map_err(FrameError::Json)?;
    match frame.data {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(data) => serde_json::from_value(data)
            .map(Some)
            .map_err(FrameError::Event),
    }
}

/// Response of `GET /api/quiz/negotiate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiateResponse {
    /// One-shot socket URL carrying a short-lived access token.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Fabric → backend webhook
// ---------------------------------------------------------------------------

/// CloudEvents headers set by the fabric on every webhook call.
pub mod headers {
    pub const EVENT_TYPE: &str = "ce-type";
    pub const USER_ID: &str = "ce-userId";
    pub const CONNECTION_ID: &str = "ce-connectionId";
    pub const HUB: &str = "ce-hub";
    pub const SIGNATURE: &str = "ce-signature";
    pub const EVENT_NAME: &str = "ce-eventName";
    /// Abuse-protection handshake, sent on `OPTIONS`.
    pub const WEBHOOK_REQUEST_ORIGIN: &str = "WebHook-Request-Origin";
    pub const WEBHOOK_ALLOWED_ORIGIN: &str = "WebHook-Allowed-Origin";
}

/// `ce-type` values the webhook understands.
pub mod event_types {
    pub const CONNECT: &str = "azure.webpubsub.sys.connect";
    pub const CONNECTED: &str = "azure.webpubsub.sys.connected";
    pub const DISCONNECTED: &str = "azure.webpubsub.sys.disconnected";
}

/// Body of a connect event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectEventRequest {
    #[serde(default)]
    pub claims: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub query: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub subprotocols: Vec<String>,
}

/// Reply to an accepted connect event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectEventResponse {
    pub user_id: String,
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subprotocol: Option<String>,
}

/// Body of a disconnected event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectedEventRequest {
    #[serde(default)]
    pub reason: Option<String>,
}
