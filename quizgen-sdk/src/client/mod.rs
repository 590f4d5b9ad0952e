//! HTTP and realtime clients for the Quizgen API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest` or `tokio-tungstenite`.

mod quiz;
mod realtime;

pub use quiz::QuizClient;
pub use realtime::{WsConnection, WsConnector};

use reqwest::StatusCode;

use crate::objects::ErrorResponse;
use crate::session::BackendError;

/// Errors produced by the SDK clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The realtime socket could not be opened.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl ClientError {
    /// The `error` field of an API error body, if there is one.
    pub fn api_message(&self) -> Option<String> {
        match self {
            ClientError::Api { body, .. } => serde_json::from_str::<ErrorResponse>(body)
                .map(|e| e.error)
                .ok(),
            _ => None,
        }
    }
}

impl From<ClientError> for BackendError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Http(ref inner) if inner.is_connect() || inner.is_timeout() => {
                BackendError::Unreachable(e.to_string())
            }
            ClientError::WebSocket(_) => BackendError::Unreachable(e.to_string()),
            ClientError::Api { status, .. } => match e.api_message() {
                Some(message) => BackendError::Rejected {
                    status: status.as_u16(),
                    message,
                },
                None => BackendError::Unexpected(e.to_string()),
            },
            other => BackendError::Unexpected(other.to_string()),
        }
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    Ok(resp)
}
