//! Fabric → backend webhook (CloudEvents HTTP binding).

use quizgen_sdk::objects::realtime::{
    ConnectEventRequest, ConnectEventResponse, DisconnectedEventRequest, WEBPUBSUB_SUBPROTOCOL,
    event_types,
};
use quizgen_sdk::signature::verify_connection_signature;

use super::{BrokerError, RealtimeBroker};

/// Groups every connection joins, besides its per-user group.
pub const DEFAULT_GROUPS: [&str; 2] = ["system", "message"];

/// The `ce-*` headers of one webhook call.
#[derive(Debug, Clone, Default)]
pub struct WebhookContext {
    pub event_type: Option<String>,
    pub hub: Option<String>,
    pub connection_id: Option<String>,
    pub user_id: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Accept the connection with this identity and group membership.
    Connect(ConnectEventResponse),
    /// A notification that needs no body in reply.
    Acknowledged,
}

impl RealtimeBroker {
    /// Abuse-protection handshake: whether `request_origin` (the value of
    /// `WebHook-Request-Origin`) is the configured fabric.
    pub fn allows_origin(&self, request_origin: &str) -> bool {
        let authority = self.config.authority();
        let host = self.config.endpoint.host_str().unwrap_or_default();
        request_origin.split(',').map(str::trim).any(|origin| {
            origin.eq_ignore_ascii_case(&authority) || origin.eq_ignore_ascii_case(host)
        })
    }

    /// Authenticate a webhook call and decide the reply.
    pub fn handle_event(
        &self,
        context: &WebhookContext,
        body: &[u8],
    ) -> Result<WebhookOutcome, BrokerError> {
        let hub = context
            .hub
            .as_deref()
            .ok_or(BrokerError::MissingHeader("ce-hub"))?;
        if !hub.eq_ignore_ascii_case(&self.config.hub) {
            return Err(BrokerError::HubMismatch {
                expected: self.config.hub.clone(),
                got: hub.to_owned(),
            });
        }
        let connection_id = context
            .connection_id
            .as_deref()
            .ok_or(BrokerError::MissingHeader("ce-connectionId"))?;
        let signature = context
            .signature
            .as_deref()
            .ok_or(BrokerError::MissingHeader("ce-signature"))?;
        verify_connection_signature(signature, connection_id, self.config.access_key.as_bytes())?;

        let event_type = context.event_type.as_deref().unwrap_or_default();
        match event_type {
            event_types::CONNECT => {
                let user_id = context
                    .user_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or(BrokerError::AnonymousUser)?;
                let request: ConnectEventRequest = if body.is_empty() {
                    ConnectEventRequest::default()
                } else {
                    serde_json::from_slice(body)?
                };
                let subprotocol = request
                    .subprotocols
                    .iter()
                    .find(|p| p.as_str() == WEBPUBSUB_SUBPROTOCOL)
                    .cloned();

                let mut groups: Vec<String> = DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect();
                groups.push(format!("user:{user_id}"));
                tracing::info!(user_id, connection_id, "accepting realtime connection");
                Ok(WebhookOutcome::Connect(ConnectEventResponse {
                    user_id: user_id.to_owned(),
                    groups,
                    subprotocol,
                }))
            }
            event_types::CONNECTED => {
                tracing::info!(
                    user_id = context.user_id.as_deref().unwrap_or_default(),
                    connection_id,
                    "realtime connection established"
                );
                Ok(WebhookOutcome::Acknowledged)
            }
            event_types::DISCONNECTED => {
                let reason = serde_json::from_slice::<DisconnectedEventRequest>(body)
                    .ok()
                    .and_then(|d| d.reason);
                tracing::info!(
                    user_id = context.user_id.as_deref().unwrap_or_default(),
                    connection_id,
                    reason = reason.as_deref().unwrap_or_default(),
                    "realtime connection closed"
                );
                Ok(WebhookOutcome::Acknowledged)
            }
            other => Err(BrokerError::UnsupportedEvent(other.to_owned())),
        }
    }
}
