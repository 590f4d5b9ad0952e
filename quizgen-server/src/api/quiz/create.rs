use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
};
use kanau::processor::Processor;
use quizgen_core::functions::SubmitCreationJob;
use quizgen_sdk::objects::creation::fields;
use quizgen_sdk::objects::{JobAck, RawCreationRequest, UploadedFile};
use quizgen_sdk::validation::{MAX_FILES, validate_creation};

use crate::api::error::ApiError;
use crate::api::extractors::SessionUser;
use crate::state::AppState;

/// `POST /create` — validate a creation request and hand it to the
/// External Processor.
///
/// Validation runs before anything is sent upstream; a rejected request
/// never reaches the function service. The response is the processor's
/// acknowledgement, not the quiz.
pub(super) async fn create_quiz(
    State(state): State<AppState>,
    user: SessionUser,
    mut multipart: Multipart,
) -> Result<Json<JobAck>, ApiError> {
    let raw = read_creation_form(&mut multipart).await?;
    let request = validate_creation(raw)?;

    let ack = state
        .functions()
        .await
        .process(SubmitCreationJob {
            request,
            user_id: user.user_id,
        })
        .await
        .map_err(ApiError::from_upstream)?;

    tracing::info!(quiz_id = %ack.id, "quiz creation job accepted");
    Ok(Json(ack))
}

fn form_error(e: MultipartError) -> ApiError {
    ApiError::Validation(format!("Invalid form data: {}", e.body_text()))
}

async fn read_creation_form(multipart: &mut Multipart) -> Result<RawCreationRequest, ApiError> {
    let mut raw = RawCreationRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            fields::QUIZ_NAME => raw.quiz_name = Some(field.text().await.map_err(form_error)?),
            fields::CONTENT | fields::CONTENT_LEGACY => {
                raw.content = Some(field.text().await.map_err(form_error)?)
            }
            fields::NUM_QUESTIONS => {
                raw.num_questions = Some(field.text().await.map_err(form_error)?)
            }
            fields::TOPIC => raw.topic = Some(field.text().await.map_err(form_error)?),
            fields::QUESTION_TYPES | "question_types[]" => {
                let value = field.text().await.map_err(form_error)?;
                raw.push_question_types(&value);
            }
            fields::FILES | fields::FILES_PLAIN => {
                // an untouched file input still submits a part with no filename
                let file_name = match field.file_name() {
                    Some(name) if !name.is_empty() => name.to_owned(),
                    _ => {
                        tracing::debug!("skipping file part without a filename");
                        continue;
                    }
                };
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                // past the limit only the count matters, so skip the bytes
                let bytes = if raw.files.len() < MAX_FILES {
                    field.bytes().await.map_err(form_error)?.to_vec()
                } else {
                    Vec::new()
                };
                raw.files.push(UploadedFile::new(file_name, content_type, bytes));
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(raw)
}
