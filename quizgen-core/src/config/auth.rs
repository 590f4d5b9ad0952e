//! Session authentication configuration.

/// Keys and lifetimes for the session cookie.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC key of the session JWT.
    pub jwt_secret: Vec<u8>,
    /// HMAC key of the cookie signature wrapped around the JWT.
    pub cookie_secret: Vec<u8>,
    pub session_ttl: time::Duration,
    /// Add `Secure` to the session cookie.
    pub secure_cookie: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("cookie_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}
