//! Quiz lifecycle request and response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the quiz list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub question_count: Option<u32>,
    /// `true` once the External Processor finished generating questions.
    #[serde(default)]
    pub processed: bool,
    /// `true` if generation failed.
    #[serde(default)]
    pub errored: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// Response of `GET /api/quiz/all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizList {
    #[serde(default)]
    pub own_quizzes: Vec<QuizSummary>,
    #[serde(default)]
    pub shared_quizzes: Vec<QuizSummary>,
}

impl QuizList {
    pub fn contains(&self, quiz_id: &str) -> bool {
        self.own_quizzes
            .iter()
            .chain(self.shared_quizzes.iter())
            .any(|q| q.id == quiz_id)
    }
}

/// A generated question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(deserialize_with = "string_or_number")]
    pub question_id: String,
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
}

/// A leaderboard entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub score: u32,
    #[serde(default)]
    pub date: Option<String>,
}

/// Response of `GET /api/quiz/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDetail {
    pub owner_name: String,
    pub quiz_name: String,
    #[serde(default)]
    pub total_questions: u32,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default, alias = "scores")]
    pub leaderboard: Vec<ScoreEntry>,
}

/// Body of `POST /api/quiz/{id}/answer`: question id → answer text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub answers: BTreeMap<String, String>,
}

/// Grading of one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedAnswer {
    #[serde(deserialize_with = "string_or_number")]
    pub question_id: String,
    pub is_correct: bool,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Response of `POST /api/quiz/{id}/answer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answers: Vec<GradedAnswer>,
    pub score: u32,
    pub is_top_score: bool,
}

/// Response of `POST /api/invite/join/{invite_code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResult {
    pub quiz_id: String,
    pub quiz_name: String,
    pub user_id: String,
}

/// Response of `POST /api/quiz/{id}/leave`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveResult {
    pub quiz_id: String,
    pub user_id: String,
}

/// The store emits numeric ids for some older quizzes.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
