//! Realtime channel broker.
//!
//! The pub/sub fabric is external. This module only mints client access
//! credentials for it ([`RealtimeBroker::negotiate`]) and answers the
//! fabric's webhook calls ([`RealtimeBroker::handle_event`]). Connections
//! and groups are owned by the fabric; nothing here stores them.

mod broker;
mod webhook;

pub use broker::{AccessCredential, RealtimeBroker};
pub use webhook::{WebhookContext, WebhookOutcome};

use quizgen_sdk::signature::SignatureError;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("cannot issue a credential without a user id")]
    AnonymousUser,

    #[error("webhook is missing header `{0}`")]
    MissingHeader(&'static str),

    #[error("webhook is for hub `{got}`, expected `{expected}`")]
    HubMismatch { expected: String, got: String },

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("unsupported webhook event `{0}`")]
    UnsupportedEvent(String),

    #[error("invalid webhook body: {0}")]
    Body(#[from] serde_json::Error),
}

impl BrokerError {
    /// Whether the fabric should be told the caller is not authorized, as
    /// opposed to having sent a bad request.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            BrokerError::AnonymousUser
                | BrokerError::MissingHeader(_)
                | BrokerError::HubMismatch { .. }
                | BrokerError::Signature(_)
        )
    }
}
