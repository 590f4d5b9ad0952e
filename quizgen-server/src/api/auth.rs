//! Authentication handlers.
//!
//! # Endpoints
//!
//! - `POST /login`        – check credentials, set the session cookie
//! - `POST /register`     – create a user, set the session cookie
//! - `POST /logout`       – clear the session cookie
//! - `GET  /authenticated` – session check
//! - `GET  /me`           – profile of the session user
//! - `GET  /profile/{id}` – public profile of any user

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderName, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use kanau::processor::Processor;
use quizgen_core::config::AuthConfig;
use quizgen_core::framework::FunctionError;
use quizgen_core::functions::{GetUser, UserLogin, UserRegister};
use quizgen_sdk::objects::{Credentials, UserProfile};
use quizgen_sdk::signature::{self, SESSION_COOKIE, TokenClaims};
use serde::Serialize;

use super::error::ApiError;
use super::extractors::SessionUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/authenticated", get(authenticated))
        .route("/me", get(me))
        .route("/profile/{user_id}", get(profile))
}

const MISSING_CREDENTIALS: &str = "Missing username or password";

/// `Set-Cookie` value carrying a fresh session for `user_id`.
pub fn session_cookie(user_id: &str, auth: &AuthConfig) -> Result<String, ApiError> {
    let claims = TokenClaims::new(user_id, auth.session_ttl);
    let jwt = signature::sign_token(&claims, &auth.jwt_secret)
        .map_err(|e| ApiError::Unknown(format!("failed to sign session: {e}")))?;
    let value = signature::sign_cookie(&jwt, &auth.cookie_secret);
    Ok(cookie_header(&value, auth.session_ttl.whole_seconds(), auth.secure_cookie))
}

fn cookie_header(value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

type SignedIn = (AppendHeaders<[(HeaderName, String); 1]>, Json<UserProfile>);

async fn signed_in(state: &AppState, user: UserProfile) -> Result<SignedIn, ApiError> {
    let cookie = session_cookie(&user.id, &*state.config.auth().await)?;
    tracing::info!(user_id = %user.id, "session issued");
    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(user)))
}

fn credentials(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, ApiError> {
    match payload {
        Ok(Json(credentials)) if credentials.is_complete() => Ok(credentials),
        _ => Err(ApiError::Validation(MISSING_CREDENTIALS.into())),
    }
}

/// `POST /login`
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<SignedIn, ApiError> {
    let credentials = credentials(payload)?;
    let user = state
        .functions()
        .await
        .process(UserLogin { credentials })
        .await
        .map_err(|e| match e.status() {
            Some(401) => ApiError::Unauthorized("Incorrect password".into()),
            Some(404) => ApiError::NotFound("Username not found".into()),
            _ => ApiError::from_upstream(e),
        })?;
    signed_in(&state, user).await
}

/// `POST /register`
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<SignedIn, ApiError> {
    let credentials = credentials(payload)?;
    let user = state
        .functions()
        .await
        .process(UserRegister { credentials })
        .await
        .map_err(|e| match e.status() {
            Some(409) => ApiError::Conflict("Username already exists".into()),
            _ => ApiError::from_upstream(e),
        })?;
    signed_in(&state, user).await
}

/// `POST /logout` — always succeeds, even without a session.
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let secure = state.config.auth().await.secure_cookie;
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, cookie_header("", 0, secure))]),
    )
}

fn user_not_found(e: FunctionError) -> ApiError {
    match e.status() {
        Some(404) => ApiError::NotFound("User not found".into()),
        _ => ApiError::from_upstream(e),
    }
}

#[derive(Debug, Serialize)]
struct SessionCheck {
    message: String,
}

/// `GET /authenticated` — 200 while the session cookie is valid.
async fn authenticated(user: SessionUser) -> Json<SessionCheck> {
    Json(SessionCheck {
        message: format!("Authenticated! User id:{}", user.user_id),
    })
}

/// `GET /me`
async fn me(
    State(state): State<AppState>,
    user: SessionUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .functions()
        .await
        .process(GetUser {
            user_id: user.user_id,
        })
        .await
        .map_err(user_not_found)?;
    Ok(Json(profile))
}

/// `GET /profile/{user_id}`
async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .functions()
        .await
        .process(GetUser { user_id })
        .await
        .map_err(user_not_found)?;
    Ok(Json(profile))
}
