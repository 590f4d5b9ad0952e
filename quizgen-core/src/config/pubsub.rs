//! Realtime fabric configuration.

use url::Url;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("connection string is missing `{0}`")]
    MissingKey(&'static str),
    #[error("connection string has an invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("connection string segment `{0}` is not key=value")]
    Malformed(String),
}

/// Where the pub/sub fabric lives and how to sign for it.
#[derive(Clone)]
pub struct PubSubConfig {
    /// `https://<host>` (or `http://` for a local emulator).
    pub endpoint: Url,
    pub access_key: String,
    pub hub: String,
    /// Lifetime of a negotiated client access token.
    pub token_ttl: time::Duration,
}

impl PubSubConfig {
    /// Build from an `Endpoint=…;AccessKey=…;Version=1.0;` connection string.
    pub fn from_connection_string(
        connection_string: &str,
        hub: impl Into<String>,
        token_ttl: time::Duration,
    ) -> Result<Self, ConnectionStringError> {
        let mut endpoint = None;
        let mut access_key = None;
        let mut port = None;

        for segment in connection_string.split(';').map(str::trim) {
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::Malformed(segment.to_owned()))?;
            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.trim()),
                "accesskey" => access_key = Some(value.trim()),
                "port" => port = Some(value.trim()),
                _ => {}
            }
        }

        let endpoint = endpoint.ok_or(ConnectionStringError::MissingKey("Endpoint"))?;
        let access_key = access_key.ok_or(ConnectionStringError::MissingKey("AccessKey"))?;

        let mut endpoint = Url::parse(endpoint)
            .map_err(|e| ConnectionStringError::InvalidEndpoint(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
            return Err(ConnectionStringError::InvalidEndpoint(endpoint.to_string()));
        }
        if let Some(port) = port {
            let port = port
                .parse::<u16>()
                .map_err(|_| ConnectionStringError::InvalidEndpoint(format!("port {port}")))?;
            endpoint
                .set_port(Some(port))
                .map_err(|_| ConnectionStringError::InvalidEndpoint(endpoint.to_string()))?;
        }
        endpoint.set_path("");

        Ok(Self {
            endpoint,
            access_key: access_key.to_owned(),
            hub: hub.into(),
            token_ttl,
        })
    }

    /// `host[:port]` of the fabric.
    pub fn authority(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        }
    }

    /// Audience a client access token must carry.
    pub fn client_audience(&self) -> String {
        format!(
            "{}/client/hubs/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.hub
        )
    }

    /// Socket URL for clients, without the token.
    pub fn client_url(&self) -> String {
        let scheme = if self.endpoint.scheme() == "http" {
            "ws"
        } else {
            "wss"
        };
        format!("{scheme}://{}/client/hubs/{}", self.authority(), self.hub)
    }
}

impl std::fmt::Debug for PubSubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSubConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_key", &"<redacted>")
            .field("hub", &self.hub)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}
