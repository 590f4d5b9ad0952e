//! HTTP API.
//!
//! Every route lives under `/api`. Unknown paths answer
//! `404 {"error": "Endpoint not found"}`.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod invite;
pub mod quiz;
pub mod tts;

use axum::Router;

use crate::state::AppState;
use error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/quiz", quiz::router())
        .nest("/api/invite", invite::router())
        .nest("/api/tts", tts::router())
        .fallback(endpoint_not_found)
}

async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".into())
}
