//! Validation gate for quiz creation and answer submission.
//!
//! The same functions run in the client before anything is sent and in the
//! server before anything is forwarded, so both sides enforce one limit set.
//! Rules are applied in a fixed order and the first failure wins.

use std::collections::BTreeSet;

use crate::objects::creation::{
    CreationRequest, QuestionType, RawCreationRequest, SUPPORTED_MIME_TYPES,
};
use crate::objects::quiz::AnswerSubmission;

pub const MAX_QUIZ_NAME_CHARS: usize = 50;
pub const MIN_CONTENT_CHARS: usize = 400;
pub const MAX_CONTENT_CHARS: usize = 2000;
pub const MAX_TOPIC_CHARS: usize = 100;
pub const MAX_FILES: usize = 3;
pub const MAX_FILE_BYTES: usize = 30 * 1024 * 1024;
pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 50;
/// Used when the client does not send `num_questions`.
pub const DEFAULT_QUESTIONS: u32 = 10;
pub const MAX_ANSWER_CHARS: usize = 200;

/// A rejected creation or answer request, one variant per rule.
///
/// `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("A quiz name is required!")]
    MissingName,
    #[error("Quiz name too long (max 50 characters)")]
    NameTooLong,
    #[error("Prompt text or a file upload is required!")]
    MissingSource,
    #[error("Prompt text must be between 400 and 2000 characters")]
    ContentLength { chars: usize },
    #[error("Topic too long (max 100 characters)")]
    TopicTooLong,
    #[error("At least one question type is required!")]
    MissingQuestionTypes,
    #[error("Unknown question type: {0}")]
    UnknownQuestionType(String),
    #[error("Maximum 3 files allowed")]
    TooManyFiles { count: usize },
    #[error("Unsupported file type: {content_type}")]
    UnsupportedFileType { content_type: String },
    #[error("File '{file_name}' is empty")]
    EmptyFile { file_name: String },
    #[error("File '{file_name}' is too large (max 30MB)")]
    FileTooLarge { file_name: String },
    #[error("Number of questions must be between 1 and 50")]
    QuestionCount,
    #[error("Your answer for question {question_id} is too long!")]
    AnswerTooLong { question_id: String },
    #[error("At least one answer is required!")]
    NoAnswers,
}

impl ValidationError {
    /// Whether this rejection is about the media type of an upload rather
    /// than the shape of the request.
    pub fn is_unsupported_media(&self) -> bool {
        matches!(self, ValidationError::UnsupportedFileType { .. })
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Run the creation rules in order and normalise the request.
pub fn validate_creation(raw: RawCreationRequest) -> Result<CreationRequest, ValidationError> {
    // 1. name
    let quiz_name = raw.quiz_name.as_deref().map(str::trim).unwrap_or_default();
    if quiz_name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if char_len(quiz_name) > MAX_QUIZ_NAME_CHARS {
        return Err(ValidationError::NameTooLong);
    }

    // 2. something to generate from
    let content = raw
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    if content.is_none() && raw.files.is_empty() {
        return Err(ValidationError::MissingSource);
    }

    // 3. content bounds
    if let Some(content) = content {
        let chars = char_len(content);
        if !(MIN_CONTENT_CHARS..=MAX_CONTENT_CHARS).contains(&chars) {
            return Err(ValidationError::ContentLength { chars });
        }
    }

    // 4. topic
    let topic = raw.topic.as_deref().map(str::trim).unwrap_or_default();
    if char_len(topic) > MAX_TOPIC_CHARS {
        return Err(ValidationError::TopicTooLong);
    }

    // 5. question types
    if raw.question_types.is_empty() {
        return Err(ValidationError::MissingQuestionTypes);
    }
    let mut question_types = BTreeSet::new();
    for tag in &raw.question_types {
        let parsed = QuestionType::from_tag(tag)
            .ok_or_else(|| ValidationError::UnknownQuestionType(tag.trim().to_owned()))?;
        question_types.insert(parsed);
    }

    // 6. files, count first so an oversized batch is rejected regardless of
    // what it contains
    if raw.files.len() > MAX_FILES {
        return Err(ValidationError::TooManyFiles {
            count: raw.files.len(),
        });
    }
    for file in &raw.files {
        let content_type = normalize_mime(&file.content_type);
        if !SUPPORTED_MIME_TYPES.contains(&content_type.as_str()) {
            return Err(ValidationError::UnsupportedFileType {
                content_type: file.content_type.clone(),
            });
        }
        if file.bytes.is_empty() {
            return Err(ValidationError::EmptyFile {
                file_name: file.file_name.clone(),
            });
        }
        if file.bytes.len() > MAX_FILE_BYTES {
            return Err(ValidationError::FileTooLarge {
                file_name: file.file_name.clone(),
            });
        }
    }

    // 7. question count
    let num_questions = match raw.num_questions.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_QUESTIONS,
        Some(n) => n.parse::<u32>().map_err(|_| ValidationError::QuestionCount)?,
    };
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&num_questions) {
        return Err(ValidationError::QuestionCount);
    }

    Ok(CreationRequest {
        quiz_name: quiz_name.to_owned(),
        content: content.map(str::to_owned),
        files: raw.files,
        num_questions,
        topic: topic.to_owned(),
        question_types: question_types.into_iter().collect(),
    })
}

/// Strip parameters (`; charset=…`) and case from a declared MIME type.
fn normalize_mime(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Trim every answer and enforce the per-answer length limit.
pub fn validate_answers(
    submission: AnswerSubmission,
) -> Result<AnswerSubmission, ValidationError> {
    if submission.answers.is_empty() {
        return Err(ValidationError::NoAnswers);
    }
    let mut answers = submission.answers;
    for (question_id, answer) in answers.iter_mut() {
        let trimmed = answer.trim();
        if char_len(trimmed) > MAX_ANSWER_CHARS {
            return Err(ValidationError::AnswerTooLong {
                question_id: question_id.clone(),
            });
        }
        *answer = trimmed.to_owned();
    }
    Ok(AnswerSubmission { answers })
}
