//! Custom Axum extractors.
//!
//! Provides:
//! - `SessionUser` — the user id carried by the signed `token` cookie.
//! - `FabricWebhook` — the CloudEvents headers of a realtime fabric webhook
//!   call. Authenticating them needs the body, so that happens in the handler.
//!
//! All cryptographic operations are delegated to [`quizgen_sdk::signature`].

use axum::http::{HeaderMap, header, request::Parts};
use axum::extract::FromRequestParts;
use quizgen_core::realtime::WebhookContext;
use quizgen_sdk::objects::realtime::headers;
use quizgen_sdk::signature::{self, SESSION_COOKIE};

use super::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// SessionUser — browser authentication via signed cookie
// ---------------------------------------------------------------------------

/// The authenticated caller.
///
/// The cookie value is `{jwt}.{signature}`: an HS256 session JWT wrapped in a
/// second HMAC with the cookie secret. Both layers are checked, then the
/// JWT expiry.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
}

/// Value of cookie `name`, if the request carries one.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookie = cookie_value(&parts.headers, SESSION_COOKIE).ok_or_else(ApiError::unauthorized)?;

        let auth = state.config.auth().await;
        let jwt = signature::unsign_cookie(&cookie, &auth.cookie_secret).map_err(|e| {
            tracing::debug!(error = %e, "session cookie signature rejected");
            ApiError::unauthorized()
        })?;
        let claims = signature::verify_token(jwt, &auth.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            ApiError::unauthorized()
        })?;
        drop(auth);

        if claims.sub.is_empty() {
            return Err(ApiError::unauthorized());
        }
        Ok(SessionUser {
            user_id: claims.sub,
        })
    }
}

// ---------------------------------------------------------------------------
// FabricWebhook — headers of a realtime fabric callback
// ---------------------------------------------------------------------------

pub struct FabricWebhook(pub WebhookContext);

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

impl<S: Send + Sync> FromRequestParts<S> for FabricWebhook {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let h = &parts.headers;
        Ok(FabricWebhook(WebhookContext {
            event_type: header_string(h, headers::EVENT_TYPE),
            hub: header_string(h, headers::HUB),
            connection_id: header_string(h, headers::CONNECTION_ID),
            user_id: header_string(h, headers::USER_ID),
            signature: header_string(h, headers::SIGNATURE),
        }))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc.def"));
        headers.append(header::COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(cookie_value(&headers, "token").as_deref(), Some("abc.def"));
        assert_eq!(cookie_value(&headers, "other").as_deref(), Some("1"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
