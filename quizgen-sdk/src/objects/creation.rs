//! Quiz creation request types.
//!
//! A [`RawCreationRequest`] is whatever the user typed or uploaded; it only
//! becomes a [`CreationRequest`] after passing
//! [`validate_creation`](crate::validation::validate_creation).

use serde::{Deserialize, Serialize};

/// Multipart field names used by `POST /api/quiz/create` and by the
/// External Processor's `upload_documents` function.
pub mod fields {
    pub const QUIZ_NAME: &str = "quiz_name";
    pub const CONTENT: &str = "content";
    /// Older clients send the prompt text under this name.
    pub const CONTENT_LEGACY: &str = "quiz_text";
    pub const NUM_QUESTIONS: &str = "num_questions";
    pub const TOPIC: &str = "topic";
    pub const QUESTION_TYPES: &str = "question_types";
    pub const FILES: &str = "files[]";
    pub const FILES_PLAIN: &str = "files";
    pub const USER_ID: &str = "user_id";
}

/// MIME type of PDF uploads.
pub const MIME_PDF: &str = "application/pdf";
/// MIME type of DOCX uploads.
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// MIME type of PPTX uploads.
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Every MIME type the creation pipeline accepts.
pub const SUPPORTED_MIME_TYPES: [&str; 3] = [MIME_PDF, MIME_DOCX, MIME_PPTX];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Kinds of question the generator can produce.
pub enum QuestionType {
    #[serde(rename = "multi-choice")]
    MultiChoice,
    #[serde(rename = "fill-blanks")]
    FillBlanks,
    #[serde(rename = "short-ans")]
    ShortAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::MultiChoice,
        QuestionType::FillBlanks,
        QuestionType::ShortAnswer,
    ];

    /// The wire tag of this question type.
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::MultiChoice => "multi-choice",
            QuestionType::FillBlanks => "fill-blanks",
            QuestionType::ShortAnswer => "short-ans",
        }
    }

    /// Parse a wire tag, tolerating surrounding whitespace.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary attachment as declared by the uploader.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    /// MIME type declared by the client; not sniffed.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Unvalidated creation input, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCreationRequest {
    pub quiz_name: Option<String>,
    pub content: Option<String>,
    pub files: Vec<UploadedFile>,
    /// Kept as text so that a non-numeric value is a validation failure
    /// rather than a decoding failure.
    pub num_questions: Option<String>,
    pub topic: Option<String>,
    pub question_types: Vec<String>,
}

impl RawCreationRequest {
    /// Add question type tags from a form value.
    ///
    /// Browsers posting an array through `FormData` join it with commas, so a
    /// single value may carry several tags.
    pub fn push_question_types(&mut self, value: &str) {
        self.question_types.extend(
            value
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
        );
    }
}

/// A creation request that passed the validation gate.
///
/// Text fields are trimmed and question types are deduplicated in a stable
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
    pub quiz_name: String,
    pub content: Option<String>,
    pub files: Vec<UploadedFile>,
    pub num_questions: u32,
    pub topic: String,
    pub question_types: Vec<QuestionType>,
}

/// Acknowledgement returned once the External Processor has accepted a job.
///
/// This is *not* the finished quiz: completion arrives later as a realtime
/// event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAck {
    /// Id of the placeholder quiz record owned by the External Processor.
    pub id: String,
    pub name: String,
}
