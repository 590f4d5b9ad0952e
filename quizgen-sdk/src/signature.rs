//! Signing primitives shared by the server and the realtime fabric contract.
//!
//! * **Tokens**: HS256 JWTs minted and checked with `jsonwebtoken`. Used for
//!   the session cookie and for the client access token handed out by
//!   negotiate.
//! * **Cookie signing**: `{value}.{base64(HMAC(value, cookie_secret))}`.
//! * **Connection signatures**: the fabric signs every webhook call with
//!   `sha256={hex(HMAC(connection_id, access_key))}`; several comma-separated
//!   values may be present while keys rotate.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "token";

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
    #[error("token audience mismatch")]
    InvalidAudience,
    #[error("token error: {0}")]
    Token(jsonwebtoken::errors::Error),
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

impl From<jsonwebtoken::errors::Error> for SignatureError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken => Self::InvalidFormat,
            ErrorKind::Base64(_) => Self::InvalidBase64,
            ErrorKind::InvalidSignature => Self::SignatureMismatch,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            _ => Self::Token(err),
        }
    }
}

fn hmac_key(key: &[u8]) -> ring::hmac::Key {
    ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key)
}

// ---------------------------------------------------------------------------
// HS256 tokens
// ---------------------------------------------------------------------------

/// Registered claims carried by every token this service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user id the token is scoped to.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Audience, set for realtime client access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl TokenClaims {
    /// Claims for `sub` valid from now for `ttl`.
    pub fn new(sub: impl Into<String>, ttl: time::Duration) -> Self {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        Self {
            sub: sub.into(),
            iat: now,
            exp: now + ttl.whole_seconds(),
            aud: None,
        }
    }

    pub fn with_audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    pub fn is_expired(&self) -> bool {
        time::OffsetDateTime::now_utc().unix_timestamp() >= self.exp
    }
}

/// Sign `claims` into a compact HS256 JWT.
pub fn sign_token(claims: &TokenClaims, key: &[u8]) -> Result<String, SignatureError> {
    let header = Header::new(Algorithm::HS256);
    Ok(encode(&header, claims, &EncodingKey::from_secret(key))?)
}

fn validation(audience: Option<&str>) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }
    validation
}

/// Verify a session JWT and reject expired tokens.
pub fn verify_token(token: &str, key: &[u8]) -> Result<TokenClaims, SignatureError> {
    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(key), &validation(None))?;
    Ok(data.claims)
}

/// Verify a realtime access JWT, which must also be issued for `audience`.
pub fn verify_access_token(
    token: &str,
    key: &[u8],
    audience: &str,
) -> Result<TokenClaims, SignatureError> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(key),
        &validation(Some(audience)),
    )?;
    Ok(data.claims)
}

// ---------------------------------------------------------------------------
// Cookie signing
// ---------------------------------------------------------------------------

/// Append an HMAC of `value` so tampering with the cookie is detectable.
pub fn sign_cookie(value: &str, key: &[u8]) -> String {
    let tag = ring::hmac::sign(&hmac_key(key), value.as_bytes());
    format!(
        "{value}.{}",
        fast32::base64::RFC4648_NOPAD.encode(tag.as_ref())
    )
}

/// Check a value produced by [`sign_cookie`] and return the inner value.
pub fn unsign_cookie<'a>(signed: &'a str, key: &[u8]) -> Result<&'a str, SignatureError> {
    let (value, signature) = signed
        .rsplit_once('.')
        .ok_or(SignatureError::InvalidFormat)?;
    let signature = fast32::base64::RFC4648_NOPAD
        .decode_str(signature)
        .map_err(|_| SignatureError::InvalidBase64)?;
    ring::hmac::verify(&hmac_key(key), value.as_bytes(), &signature)?;
    Ok(value)
}

// ---------------------------------------------------------------------------
// Fabric connection signatures
// ---------------------------------------------------------------------------

/// Compute the `sha256=<hex>` signature the fabric attaches for `connection_id`.
pub fn connection_signature(connection_id: &str, access_key: &[u8]) -> String {
    let tag = ring::hmac::sign(&hmac_key(access_key), connection_id.as_bytes());
    format!("sha256={}", to_hex(tag.as_ref()))
}

/// Verify a `ce-signature` header value against `connection_id`.
///
/// The header may list several signatures; any valid one is accepted.
pub fn verify_connection_signature(
    header_value: &str,
    connection_id: &str,
    access_key: &[u8],
) -> Result<(), SignatureError> {
    let key = hmac_key(access_key);
    let mut saw_candidate = false;
    for candidate in header_value.split(',') {
        let Some(hex) = candidate.trim().strip_prefix("sha256=") else {
            continue;
        };
        saw_candidate = true;
        let Some(bytes) = from_hex(hex) else {
            continue;
        };
        if ring::hmac::verify(&key, connection_id.as_bytes(), &bytes).is_ok() {
            return Ok(());
        }
    }
    if saw_candidate {
        Err(SignatureError::SignatureMismatch)
    } else {
        Err(SignatureError::InvalidFormat)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"unit-test-secret";

    #[test]
    fn test_token_round_trip_and_tamper() {
        let claims = TokenClaims::new("user-1", time::Duration::days(1));
        let token = sign_token(&claims, KEY).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = verify_token(&token, KEY).unwrap();
        assert_eq!(decoded, claims);

        assert!(matches!(
            verify_token(&token, b"other-secret"),
            Err(SignatureError::SignatureMismatch)
        ));

        let mut forged = token.clone();
        forged.push('A');
        assert!(verify_token(&forged, KEY).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = TokenClaims::new("user-1", time::Duration::seconds(-5));
        let token = sign_token(&claims, KEY).unwrap();
        assert!(matches!(
            verify_token(&token, KEY),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            verify_token("only.two", KEY),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(verify_token("a.b.c.d", KEY).is_err());
    }

    #[test]
    fn test_access_token_audience() {
        let aud = "https://fabric.example.com/client/hubs/hub";
        let claims = TokenClaims::new("user-1", time::Duration::HOUR).with_audience(aud);
        let token = sign_token(&claims, KEY).unwrap();

        assert_eq!(verify_access_token(&token, KEY, aud).unwrap().sub, "user-1");
        assert!(matches!(
            verify_access_token(&token, KEY, "https://other.example.com/client/hubs/hub"),
            Err(SignatureError::InvalidAudience)
        ));
    }

    #[test]
    fn test_cookie_signing() {
        let signed = sign_cookie("header.payload.sig", KEY);
        assert_eq!(unsign_cookie(&signed, KEY).unwrap(), "header.payload.sig");
        assert!(unsign_cookie(&signed, b"wrong").is_err());
        assert!(unsign_cookie("no-dot-here", KEY).is_err());
    }

    #[test]
    fn test_connection_signature_accepts_any_listed_key() {
        let good = connection_signature("conn-1", KEY);
        let stale = connection_signature("conn-1", b"rotated-out");
        let header = format!("{stale}, {good}");
        assert!(verify_connection_signature(&header, "conn-1", KEY).is_ok());
        assert!(matches!(
            verify_connection_signature(&stale, "conn-1", KEY),
            Err(SignatureError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_connection_signature("md5=abc", "conn-1", KEY),
            Err(SignatureError::InvalidFormat)
        ));
    }
}
