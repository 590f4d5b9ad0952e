use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use kanau::processor::Processor;
use quizgen_core::functions::{AnswerQuiz, DeleteQuiz, GetAllQuizzes, GetQuiz, LeaveQuiz};
use quizgen_sdk::objects::{AnswerResult, AnswerSubmission, LeaveResult, QuizDetail, QuizList};
use quizgen_sdk::validation::validate_answers;

use crate::api::error::ApiError;
use crate::api::extractors::SessionUser;
use crate::state::AppState;

/// `GET /all`
pub(super) async fn list_quizzes(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<QuizList>, ApiError> {
    let list = state
        .functions()
        .await
        .process(GetAllQuizzes {
            user_id: user.user_id,
        })
        .await
        .map_err(ApiError::from_upstream)?;
    Ok(Json(list))
}

/// `GET /{quiz_id}`
pub(super) async fn get_quiz(
    State(state): State<AppState>,
    user: SessionUser,
    Path(quiz_id): Path<String>,
) -> Result<Json<QuizDetail>, ApiError> {
    let detail = state
        .functions()
        .await
        .process(GetQuiz {
            quiz_id,
            user_id: user.user_id,
        })
        .await
        .map_err(ApiError::from_upstream)?;
    Ok(Json(detail))
}

/// `DELETE /{quiz_id}`
pub(super) async fn delete_quiz(
    State(state): State<AppState>,
    user: SessionUser,
    Path(quiz_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .functions()
        .await
        .process(DeleteQuiz {
            quiz_id: quiz_id.clone(),
            user_id: user.user_id,
        })
        .await
        .map_err(ApiError::from_upstream)?;
    tracing::info!(%quiz_id, "quiz deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /{quiz_id}/leave`
pub(super) async fn leave_quiz(
    State(state): State<AppState>,
    user: SessionUser,
    Path(quiz_id): Path<String>,
) -> Result<Json<LeaveResult>, ApiError> {
    let left = state
        .functions()
        .await
        .process(LeaveQuiz {
            quiz_id,
            user_id: user.user_id,
        })
        .await
        .map_err(ApiError::from_upstream)?;
    Ok(Json(left))
}

/// `POST /{quiz_id}/answer` — answers are trimmed and length-checked
/// before grading.
pub(super) async fn answer_quiz(
    State(state): State<AppState>,
    user: SessionUser,
    Path(quiz_id): Path<String>,
    payload: Result<Json<AnswerSubmission>, JsonRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    let Json(submission) = payload?;
    let submission = validate_answers(submission)?;
    let result = state
        .functions()
        .await
        .process(AnswerQuiz {
            quiz_id,
            user_id: user.user_id,
            submission,
        })
        .await
        .map_err(ApiError::from_upstream)?;
    Ok(Json(result))
}
