//! Speech synthesis proxy.
//!
//! - `POST /convertToSpeech` – WAV audio for `{"text": …}`
//!
//! Clips are cached by exact text, so replaying a question does not call
//! the synthesizer again.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::IntoResponse,
    routing::post,
};
use kanau::processor::Processor;
use quizgen_core::functions::ConvertToSpeech;
use quizgen_sdk::objects::SpeechRequest;

use super::error::ApiError;
use super::extractors::SessionUser;
use crate::state::AppState;

const TEXT_REQUIRED: &str = "Text is required for speech synthesis";

pub fn router() -> Router<AppState> {
    Router::new().route("/convertToSpeech", post(convert_to_speech))
}

async fn convert_to_speech(
    State(state): State<AppState>,
    _user: SessionUser,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let text = match payload {
        Ok(Json(request)) if !request.text.trim().is_empty() => request.text,
        _ => return Err(ApiError::Validation(TEXT_REQUIRED.into())),
    };

    let audio = match state.speech_cache.get(&text).await {
        Some(audio) => {
            tracing::debug!(chars = text.chars().count(), "speech cache hit");
            audio
        }
        None => {
            let audio = state
                .functions()
                .await
                .process(ConvertToSpeech { text: text.clone() })
                .await
                .map_err(ApiError::SpeechSynthesis)?;
            state.speech_cache.insert(text, audio.clone()).await;
            audio
        }
    };

    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio))
}
