pub mod auth;
pub mod creation;
pub mod quiz;
pub mod realtime;

pub use auth::{Credentials, UserProfile};
pub use creation::{
    CreationRequest, JobAck, QuestionType, RawCreationRequest, SUPPORTED_MIME_TYPES, UploadedFile,
};
pub use quiz::{
    AnswerResult, AnswerSubmission, GradedAnswer, JoinResult, LeaveResult, Question, QuizDetail,
    QuizList, QuizSummary, ScoreEntry,
};
pub use realtime::{NegotiateResponse, RealtimeEvent};

use serde::{Deserialize, Serialize};

/// Body of every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `POST /api/tts/convertToSpeech`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
}
