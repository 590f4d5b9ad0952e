//! TOML file configuration structures.
//!
//! These structs directly map to the `quizgen-config.toml` file format.
//! Every secret may be left out of the file and supplied through the
//! environment instead.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub function_service: FunctionServiceConfig,
    #[serde(default)]
    pub pubsub: PubSubConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// The External Processor / External Store function host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionServiceConfig {
    pub url: Url,
    /// Function access code. Overridden by `FUNCTION_SERVICE_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Realtime fabric section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubConfig {
    /// `Endpoint=…;AccessKey=…;Version=1.0;`. Overridden by
    /// `PUBSUB_CONNECTION_STRING`.
    #[serde(default)]
    pub connection_string: Option<String>,
    #[serde(default = "default_hub")]
    pub hub: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            hub: default_hub(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

fn default_hub() -> String {
    "hub".to_owned()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

/// Session cookie section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Overridden by `JWT_SECRET`.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Overridden by `COOKIE_SECRET`.
    #[serde(default)]
    pub cookie_secret: Option<String>,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_secure_cookie")]
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            cookie_secret: None,
            session_ttl_secs: default_session_ttl_secs(),
            secure_cookie: default_secure_cookie(),
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    86_400
}

fn default_secure_cookie() -> bool {
    true
}

/// Speech synthesis cache section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    172_800
}

fn default_cache_capacity() -> usize {
    512
}
