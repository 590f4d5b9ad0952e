//! Error type shared by every handler.
//!
//! Every failure is rendered as `{"error": "<message>"}`. Upstream failures
//! are translated by status code; their raw bodies never reach the client
//! unless the status says the message is meant for the user.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quizgen_core::framework::FunctionError;
use quizgen_core::realtime::BrokerError;
use quizgen_sdk::objects::ErrorResponse;
use quizgen_sdk::validation::ValidationError;

pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request failed local validation.
    #[error("{0}")]
    Validation(String),

    /// An upload's type is not accepted.
    #[error("{0}")]
    UnsupportedMedia(String),

    /// The function service refused the request with a message for the user.
    #[error("{message}")]
    UpstreamRejection { status: StatusCode, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    /// The function service could not be reached.
    #[error("function service unreachable: {0}")]
    Transport(String),

    #[error("internal error: {0}")]
    Unknown(String),

    #[error("An error occurred while synthesizing speech")]
    SpeechSynthesis(#[source] FunctionError),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".into())
    }

    /// Translate a function service failure by its status code.
    pub fn from_upstream(err: FunctionError) -> Self {
        match err {
            FunctionError::Status { status, message } => match status {
                400 => ApiError::Validation(message),
                401 => ApiError::Unauthorized(message),
                403 => ApiError::Forbidden(message),
                404 => ApiError::NotFound(message),
                409 => ApiError::Conflict(message),
                415 => ApiError::UnsupportedMedia(message),
                402..=499 => match StatusCode::from_u16(status) {
                    Ok(status) => ApiError::UpstreamRejection { status, message },
                    Err(_) => ApiError::Unknown(format!("upstream status {status}: {message}")),
                },
                _ => ApiError::Unknown(format!("upstream status {status}: {message}")),
            },
            FunctionError::Transport(e) => ApiError::Transport(e.to_string()),
            other => ApiError::Unknown(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::UpstreamRejection { status, .. } => *status,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Transport(_) | ApiError::Unknown(_) | ApiError::SpeechSynthesis(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Transport(_) | ApiError::Unknown(_) => UNKNOWN_ERROR.to_owned(),
            other => other.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        if err.is_unsupported_media() {
            ApiError::UnsupportedMedia(err.to_string())
        } else {
            ApiError::Validation(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        if err.is_unauthorized() {
            tracing::warn!(error = %err, "rejected realtime webhook");
            ApiError::unauthorized()
        } else {
            match err {
                BrokerError::UnsupportedEvent(_) | BrokerError::Body(_) => {
                    ApiError::Validation(err.to_string())
                }
                other => ApiError::Unknown(other.to_string()),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, source = ?std::error::Error::source(&self), "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(ErrorResponse::new(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(status: u16, message: &str) -> ApiError {
        ApiError::from_upstream(FunctionError::Status {
            status,
            message: message.into(),
        })
    }

    #[test]
    fn test_upstream_statuses_are_translated() {
        assert_eq!(upstream(400, "bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(upstream(403, "no").status(), StatusCode::FORBIDDEN);
        assert_eq!(upstream(404, "gone").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            upstream(415, "not a pdf").status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(upstream(429, "slow down").status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(upstream(503, "down").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = upstream(500, "stack trace at line 42");
        assert_eq!(err.public_message(), UNKNOWN_ERROR);
        let err = upstream(404, "Quiz not found");
        assert_eq!(err.public_message(), "Quiz not found");
    }

    #[test]
    fn test_validation_errors_split_on_media() {
        let err: ApiError = ValidationError::UnsupportedFileType {
            content_type: "image/png".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let err: ApiError = ValidationError::TooManyFiles { count: 4 }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Maximum 3 files allowed");
    }
}
