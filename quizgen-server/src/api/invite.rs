//! Invite handlers.
//!
//! - `POST /join/{invite_code}` – join a shared quiz by its invite code

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use kanau::processor::Processor;
use quizgen_core::functions::JoinQuiz;
use quizgen_sdk::objects::JoinResult;

use super::error::ApiError;
use super::extractors::SessionUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/join/{invite_code}", post(join))
}

async fn join(
    State(state): State<AppState>,
    user: SessionUser,
    Path(invite_code): Path<String>,
) -> Result<Json<JoinResult>, ApiError> {
    let joined = state
        .functions()
        .await
        .process(JoinQuiz {
            invite_code,
            user_id: user.user_id,
        })
        .await
        .map_err(ApiError::from_upstream)?;
    tracing::info!(quiz_id = %joined.quiz_id, user_id = %joined.user_id, "joined quiz");
    Ok(Json(joined))
}
