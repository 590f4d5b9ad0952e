//! Configuration module for quizgen-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    AuthConfig, ConfigSections, FunctionServiceConfig, PubSubConfig, ServerConfig, SpeechConfig,
};
use quizgen_core::config::ConnectionStringError;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Environment variables that take precedence over the file.
pub mod env {
    pub const FUNCTION_SERVICE_TOKEN: &str = "FUNCTION_SERVICE_TOKEN";
    pub const JWT_SECRET: &str = "JWT_SECRET";
    pub const COOKIE_SECRET: &str = "COOKIE_SECRET";
    pub const PUBSUB_CONNECTION_STRING: &str = "PUBSUB_CONNECTION_STRING";
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("`{0}` is not set in the config file or the environment")]
    MissingSecret(&'static str),

    #[error("invalid pubsub connection string: {0}")]
    ConnectionString(#[from] ConnectionStringError),
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Create a new config loader reading secrets from the process environment.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self::with_env(config_path, listen_override, |key| std::env::var(key).ok())
    }

    pub fn with_env(
        config_path: impl AsRef<Path>,
        listen_override: Option<SocketAddr>,
        env: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
            env: Box::new(env),
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Build the runtime sections
    pub fn load(&self) -> Result<ConfigSections, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<ConfigSections, ConfigError> {
        self.load()
    }

    fn load_str(&self, config_content: &str) -> Result<ConfigSections, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        self.apply_env(&mut file_config);

        self.validate(&file_config)?;
        self.build_sections(file_config)
    }

    fn apply_env(&self, config: &mut FileConfig) {
        let lookup = |key: &str| (self.env)(key).filter(|v: &String| !v.is_empty());
        if let Some(token) = lookup(env::FUNCTION_SERVICE_TOKEN) {
            config.function_service.token = Some(token);
        }
        if let Some(secret) = lookup(env::JWT_SECRET) {
            config.auth.jwt_secret = Some(secret);
        }
        if let Some(secret) = lookup(env::COOKIE_SECRET) {
            config.auth.cookie_secret = Some(secret);
        }
        if let Some(connection_string) = lookup(env::PUBSUB_CONNECTION_STRING) {
            config.pubsub.connection_string = Some(connection_string);
        }
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.function_service.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "function_service.timeout_secs must be positive".into(),
            ));
        }
        if config.pubsub.hub.is_empty() {
            return Err(ConfigError::ValidationError("pubsub.hub must not be empty".into()));
        }
        if config.pubsub.token_ttl_secs == 0 || config.auth.session_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "token lifetimes must be positive".into(),
            ));
        }
        Ok(())
    }

    fn build_sections(&self, file_config: FileConfig) -> Result<ConfigSections, ConfigError> {
        let FileConfig {
            server,
            function_service,
            pubsub,
            auth,
            speech,
        } = file_config;

        let token = non_empty(function_service.token)
            .ok_or(ConfigError::MissingSecret(env::FUNCTION_SERVICE_TOKEN))?;
        let jwt_secret =
            non_empty(auth.jwt_secret).ok_or(ConfigError::MissingSecret(env::JWT_SECRET))?;
        let cookie_secret =
            non_empty(auth.cookie_secret).ok_or(ConfigError::MissingSecret(env::COOKIE_SECRET))?;
        let connection_string = non_empty(pubsub.connection_string)
            .ok_or(ConfigError::MissingSecret(env::PUBSUB_CONNECTION_STRING))?;

        Ok(ConfigSections {
            server: ServerConfig {
                listen: server.listen,
            },
            function_service: FunctionServiceConfig {
                base_url: function_service.url,
                token,
                timeout: std::time::Duration::from_secs(function_service.timeout_secs),
            },
            pubsub: PubSubConfig::from_connection_string(
                &connection_string,
                pubsub.hub,
                seconds(pubsub.token_ttl_secs),
            )?,
            auth: AuthConfig {
                jwt_secret: jwt_secret.into_bytes(),
                cookie_secret: cookie_secret.into_bytes(),
                session_ttl: seconds(auth.session_ttl_secs),
                secure_cookie: auth.secure_cookie,
            },
            speech: SpeechConfig {
                cache_ttl: std::time::Duration::from_secs(speech.cache_ttl_secs),
                cache_capacity: speech.cache_capacity,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn seconds(secs: u64) -> time::Duration {
    time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}
