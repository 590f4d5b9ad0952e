use quizgen_sdk::signature::{TokenClaims, sign_token};
use time::OffsetDateTime;

use super::BrokerError;
use crate::config::PubSubConfig;

/// A one-shot socket URL for one user. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCredential {
    pub url: String,
    pub expires_at: OffsetDateTime,
}

/// Credential minting and webhook handling for one hub.
#[derive(Debug, Clone)]
pub struct RealtimeBroker {
    pub(super) config: PubSubConfig,
}

impl RealtimeBroker {
    pub fn new(config: PubSubConfig) -> Self {
        Self { config }
    }

    pub fn hub(&self) -> &str {
        &self.config.hub
    }

    /// Mint a credential for `user_id`.
    ///
    /// The token is an HS256 JWT signed with the fabric access key, with the
    /// hub's client URL as audience and the user id as subject. The fabric
    /// uses the subject as the connection's user id, which is what the
    /// External Processor targets when it publishes.
    pub fn negotiate(&self, user_id: &str) -> Result<AccessCredential, BrokerError> {
        if user_id.trim().is_empty() {
            return Err(BrokerError::AnonymousUser);
        }
        let claims = TokenClaims::new(user_id, self.config.token_ttl)
            .with_audience(self.config.client_audience());
        let token = sign_token(&claims, self.config.access_key.as_bytes())?;
        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .unwrap_or_else(|_| OffsetDateTime::now_utc() + self.config.token_ttl);

        tracing::debug!(user_id, hub = %self.config.hub, "issued realtime credential");
        Ok(AccessCredential {
            url: format!(
                "{}?access_token={}",
                self.config.client_url(),
                urlencoding::encode(&token)
            ),
            expires_at,
        })
    }
}
