use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use quizgen_core::realtime::WebhookOutcome;
use quizgen_sdk::objects::NegotiateResponse;
use quizgen_sdk::objects::realtime::headers;

use crate::api::error::ApiError;
use crate::api::extractors::{FabricWebhook, SessionUser};
use crate::state::AppState;

/// `GET /negotiate` — a fresh, short-lived socket URL for the session user.
pub(super) async fn negotiate(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<NegotiateResponse>, ApiError> {
    let credential = state.broker().await.negotiate(&user.user_id)?;
    Ok(Json(NegotiateResponse {
        url: credential.url,
    }))
}

/// `OPTIONS /eventhandler` — the fabric's abuse-protection handshake.
pub(super) async fn abuse_protection(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<Response, ApiError> {
    let origin = request_headers
        .get(headers::WEBHOOK_REQUEST_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Validation("Missing WebHook-Request-Origin".into()))?;

    if !state.broker().await.allows_origin(origin) {
        tracing::warn!(origin, "webhook origin not allowed");
        return Err(ApiError::Forbidden("Origin not allowed".into()));
    }
    Ok((
        StatusCode::OK,
        [(headers::WEBHOOK_ALLOWED_ORIGIN, origin.to_owned())],
    )
        .into_response())
}

/// `POST /eventhandler` — connect, connected and disconnected events.
pub(super) async fn event_handler(
    State(state): State<AppState>,
    FabricWebhook(context): FabricWebhook,
    body: Bytes,
) -> Result<Response, ApiError> {
    match state.broker().await.handle_event(&context, &body)? {
        WebhookOutcome::Connect(response) => Ok(Json(response).into_response()),
        WebhookOutcome::Acknowledged => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
