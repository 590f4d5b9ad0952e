use kanau::processor::Processor;
use quizgen_sdk::objects::{
    AnswerResult, AnswerSubmission, JoinResult, LeaveResult, QuizDetail, QuizList,
};
use serde::Serialize;

use crate::framework::{FunctionError, FunctionService};

/// Both lists of quizzes a user can see.
#[derive(Debug, Clone)]
pub struct GetAllQuizzes {
    pub user_id: String,
}

impl Processor<GetAllQuizzes> for FunctionService {
    type Output = QuizList;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:GetAllQuizzes")]
    async fn process(&self, query: GetAllQuizzes) -> Result<QuizList, FunctionError> {
        let request = self.get("quiz_get_all")?.query(&[("id", &query.user_id)]);
        self.call_json(request).await
    }
}

/// One quiz as seen by `user_id`. The store decides whether the user may
/// see it.
#[derive(Debug, Clone)]
pub struct GetQuiz {
    pub quiz_id: String,
    pub user_id: String,
}

impl Processor<GetQuiz> for FunctionService {
    type Output = QuizDetail;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:GetQuiz")]
    async fn process(&self, query: GetQuiz) -> Result<QuizDetail, FunctionError> {
        let request = self
            .get("quiz_get")?
            .query(&[("quiz_id", &query.quiz_id), ("user_id", &query.user_id)]);
        self.call_json(request).await
    }
}

/// Body shared by the functions that act on one quiz for one user.
#[derive(Debug, Clone, Serialize)]
struct QuizMembership<'a> {
    quiz_id: &'a str,
    user_id: &'a str,
}

/// Delete a quiz the user owns.
#[derive(Debug, Clone)]
pub struct DeleteQuiz {
    pub quiz_id: String,
    pub user_id: String,
}

impl Processor<DeleteQuiz> for FunctionService {
    type Output = ();
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:DeleteQuiz")]
    async fn process(&self, query: DeleteQuiz) -> Result<(), FunctionError> {
        let request = self.delete("quiz_delete")?.json(&QuizMembership {
            quiz_id: &query.quiz_id,
            user_id: &query.user_id,
        });
        self.call_bytes(request).await.map(drop)
    }
}

/// Stop sharing a quiz with the user.
#[derive(Debug, Clone)]
pub struct LeaveQuiz {
    pub quiz_id: String,
    pub user_id: String,
}

impl Processor<LeaveQuiz> for FunctionService {
    type Output = LeaveResult;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:LeaveQuiz")]
    async fn process(&self, query: LeaveQuiz) -> Result<LeaveResult, FunctionError> {
        let request = self.post("quiz_leave")?.json(&QuizMembership {
            quiz_id: &query.quiz_id,
            user_id: &query.user_id,
        });
        self.call_json(request).await
    }
}

/// Join a quiz through its invite code.
#[derive(Debug, Clone)]
pub struct JoinQuiz {
    pub invite_code: String,
    pub user_id: String,
}

#[derive(Serialize)]
struct JoinBody<'a> {
    invite_code: &'a str,
    user_id: &'a str,
}

impl Processor<JoinQuiz> for FunctionService {
    type Output = JoinResult;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:JoinQuiz")]
    async fn process(&self, query: JoinQuiz) -> Result<JoinResult, FunctionError> {
        let request = self.post("quiz_join")?.json(&JoinBody {
            invite_code: &query.invite_code,
            user_id: &query.user_id,
        });
        self.call_json(request).await
    }
}

/// Grade a set of answers. The submission must already be trimmed.
#[derive(Debug, Clone)]
pub struct AnswerQuiz {
    pub quiz_id: String,
    pub user_id: String,
    pub submission: AnswerSubmission,
}

#[derive(Serialize)]
struct AnswerBody<'a> {
    quiz_id: &'a str,
    user_id: &'a str,
    answers: &'a std::collections::BTreeMap<String, String>,
}

impl Processor<AnswerQuiz> for FunctionService {
    type Output = AnswerResult;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:AnswerQuiz")]
    async fn process(&self, query: AnswerQuiz) -> Result<AnswerResult, FunctionError> {
        let request = self.post("answer_quiz")?.json(&AnswerBody {
            quiz_id: &query.quiz_id,
            user_id: &query.user_id,
            answers: &query.submission.answers,
        });
        self.call_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::framework::test_support::service;

    #[tokio::test]
    async fn test_get_quiz_sends_both_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quiz_get"))
            .and(query_param("quiz_id", "q1"))
            .and(query_param("user_id", "u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "owner_name": "alice",
                "quiz_name": "History Quiz",
                "total_questions": 0,
                "processed": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let detail = service(&server)
            .process(GetQuiz {
                quiz_id: "q1".into(),
                user_id: "u1".into(),
            })
            .await
            .unwrap();
        assert_eq!(detail.owner_name, "alice");
    }

    #[tokio::test]
    async fn test_delete_ignores_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/quiz_delete"))
            .and(body_json(serde_json::json!({"quiz_id": "q1", "user_id": "u1"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
            .expect(1)
            .mount(&server)
            .await;

        service(&server)
            .process(DeleteQuiz {
                quiz_id: "q1".into(),
                user_id: "u1".into(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_answer_body_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/answer_quiz"))
            .and(body_json(serde_json::json!({
                "quiz_id": "q1",
                "user_id": "u1",
                "answers": {"1": "Henry VIII"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answers": [{"question_id": 1, "is_correct": true}],
                "score": 1,
                "is_top_score": true
            })))
            .mount(&server)
            .await;

        let mut submission = AnswerSubmission::default();
        submission
            .answers
            .insert("1".into(), "Henry VIII".into());
        let result = service(&server)
            .process(AnswerQuiz {
                quiz_id: "q1".into(),
                user_id: "u1".into(),
                submission,
            })
            .await
            .unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.answers[0].question_id, "1");
    }

    #[tokio::test]
    async fn test_join_with_bad_code_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/quiz_join"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "Invite code not found"})),
            )
            .mount(&server)
            .await;

        let err = service(&server)
            .process(JoinQuiz {
                invite_code: "nope".into(),
                user_id: "u1".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
