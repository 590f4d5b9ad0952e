//! Configuration types for Quizgen.
//!
//! These types represent the validated runtime configuration used by the
//! server. Loading and parsing the TOML file is handled by the server crate.

mod auth;
mod function_service;
mod pubsub;
mod speech;

pub use auth::AuthConfig;
pub use function_service::FunctionServiceConfig;
pub use pubsub::{ConnectionStringError, PubSubConfig};
pub use speech::SpeechConfig;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// Server configuration with runtime values.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port to listen on.
    pub listen: SocketAddr,
}

/// Shared configuration state with separate locks for each section.
///
/// Handlers take a read lock on the section they need, clone what they use
/// and drop the guard before any outbound call.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub function_service: Arc<RwLock<FunctionServiceConfig>>,
    pub pubsub: Arc<RwLock<PubSubConfig>>,
    pub auth: Arc<RwLock<AuthConfig>>,
    pub speech: Arc<RwLock<SpeechConfig>>,
}

/// Every section, as produced by one load of the config file.
#[derive(Debug, Clone)]
pub struct ConfigSections {
    pub server: ServerConfig,
    pub function_service: FunctionServiceConfig,
    pub pubsub: PubSubConfig,
    pub auth: AuthConfig,
    pub speech: SpeechConfig,
}

impl SharedConfig {
    pub fn new(sections: ConfigSections) -> Self {
        Self {
            server: Arc::new(RwLock::new(sections.server)),
            function_service: Arc::new(RwLock::new(sections.function_service)),
            pubsub: Arc::new(RwLock::new(sections.pubsub)),
            auth: Arc::new(RwLock::new(sections.auth)),
            speech: Arc::new(RwLock::new(sections.speech)),
        }
    }

    pub async fn server(&self) -> RwLockReadGuard<'_, ServerConfig> {
        self.server.read().await
    }

    pub async fn function_service(&self) -> RwLockReadGuard<'_, FunctionServiceConfig> {
        self.function_service.read().await
    }

    pub async fn pubsub(&self) -> RwLockReadGuard<'_, PubSubConfig> {
        self.pubsub.read().await
    }

    pub async fn auth(&self) -> RwLockReadGuard<'_, AuthConfig> {
        self.auth.read().await
    }

    pub async fn speech(&self) -> RwLockReadGuard<'_, SpeechConfig> {
        self.speech.read().await
    }

    /// Replace every section. Sections are updated one after the other, so a
    /// reader may briefly see a mix of old and new sections.
    pub async fn update_all(&self, sections: ConfigSections) {
        *self.server.write().await = sections.server;
        *self.function_service.write().await = sections.function_service;
        *self.pubsub.write().await = sections.pubsub;
        *self.auth.write().await = sections.auth;
        *self.speech.write().await = sections.speech;
    }
}
