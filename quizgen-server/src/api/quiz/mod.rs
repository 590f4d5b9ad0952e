//! Quiz handlers.
//!
//! # Endpoints
//!
//! - `POST         /create`       – validate and submit a creation job (multipart)
//! - `GET          /all`          – own and shared quizzes
//! - `GET          /negotiate`    – realtime access URL for the session user
//! - `OPTIONS/POST /eventhandler` – realtime fabric webhook
//! - `GET          /{quiz_id}`    – quiz detail
//! - `DELETE       /{quiz_id}`    – delete an owned quiz
//! - `POST         /{quiz_id}/leave`  – stop sharing a quiz
//! - `POST         /{quiz_id}/answer` – grade answers

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use quizgen_sdk::validation::{MAX_FILE_BYTES, MAX_FILES};

use crate::state::AppState;

mod create;
mod manage;
mod realtime;

/// Room for the largest valid upload plus the text fields.
const CREATE_BODY_LIMIT: usize = MAX_FILES * MAX_FILE_BYTES + 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/create",
            post(create::create_quiz).layer(DefaultBodyLimit::max(CREATE_BODY_LIMIT)),
        )
        .route("/all", get(manage::list_quizzes))
        .route("/negotiate", get(realtime::negotiate))
        .route(
            "/eventhandler",
            post(realtime::event_handler).options(realtime::abuse_protection),
        )
        .route(
            "/{quiz_id}",
            get(manage::get_quiz).delete(manage::delete_quiz),
        )
        .route("/{quiz_id}/leave", post(manage::leave_quiz))
        .route("/{quiz_id}/answer", post(manage::answer_quiz))
}
