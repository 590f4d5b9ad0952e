//! Typed client for the browser-facing API.
//!
//! Authentication is a session cookie set by `login`/`register`, so the
//! underlying `reqwest::Client` keeps a cookie store.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use url::Url;

use super::{ClientError, check_status, parse_response};
use crate::objects::creation::fields;
use crate::objects::{
    AnswerResult, AnswerSubmission, CreationRequest, Credentials, JobAck, JoinResult,
    LeaveResult, NegotiateResponse, QuizDetail, QuizList, SpeechRequest, UserProfile,
};
use crate::session::{BackendError, QuizBackend};

/// Typed HTTP client for the Quizgen API.
#[derive(Debug, Clone)]
pub struct QuizClient {
    http: Client,
    base_url: Url,
}

impl QuizClient {
    /// Create a new `QuizClient` with its own cookie store.
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self { http, base_url })
    }

    /// Replace the default `reqwest::Client`. The replacement needs a cookie
    /// store for the session to survive between calls.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /api/auth/login`
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ClientError> {
        let url = self.base_url.join("/api/auth/login")?;
        let resp = self.http.post(url).json(credentials).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/auth/register`
    pub async fn register(&self, credentials: &Credentials) -> Result<UserProfile, ClientError> {
        let url = self.base_url.join("/api/auth/register")?;
        let resp = self.http.post(url).json(credentials).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/auth/me`
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        let url = self.base_url.join("/api/auth/me")?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/auth/logout`
    pub async fn logout(&self) -> Result<(), ClientError> {
        let url = self.base_url.join("/api/auth/logout")?;
        let resp = self.http.post(url).send().await?;
        check_status(resp).await.map(drop)
    }

    /// `GET /api/quiz/all`
    pub async fn list_quizzes(&self) -> Result<QuizList, ClientError> {
        let url = self.base_url.join("/api/quiz/all")?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/quiz/{quiz_id}`
    pub async fn get_quiz(&self, quiz_id: &str) -> Result<QuizDetail, ClientError> {
        let url = self.quiz_url(quiz_id, "")?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `DELETE /api/quiz/{quiz_id}`
    pub async fn delete_quiz(&self, quiz_id: &str) -> Result<(), ClientError> {
        let url = self.quiz_url(quiz_id, "")?;
        let resp = self.http.delete(url).send().await?;
        check_status(resp).await.map(drop)
    }

    /// `POST /api/quiz/{quiz_id}/leave`
    pub async fn leave_quiz(&self, quiz_id: &str) -> Result<LeaveResult, ClientError> {
        let url = self.quiz_url(quiz_id, "/leave")?;
        let resp = self.http.post(url).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/quiz/{quiz_id}/answer`
    pub async fn answer_quiz(
        &self,
        quiz_id: &str,
        submission: &AnswerSubmission,
    ) -> Result<AnswerResult, ClientError> {
        let url = self.quiz_url(quiz_id, "/answer")?;
        let resp = self.http.post(url).json(submission).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/invite/join/{invite_code}`
    pub async fn join_quiz(&self, invite_code: &str) -> Result<JoinResult, ClientError> {
        let url = self.base_url.join(&format!(
            "/api/invite/join/{}",
            urlencoding::encode(invite_code)
        ))?;
        let resp = self.http.post(url).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/quiz/create` as `multipart/form-data`.
    pub async fn create_quiz(&self, request: &CreationRequest) -> Result<JobAck, ClientError> {
        let url = self.base_url.join("/api/quiz/create")?;
        let form = creation_form(request)?;
        let resp = self.http.post(url).multipart(form).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/quiz/negotiate`
    pub async fn negotiate(&self) -> Result<NegotiateResponse, ClientError> {
        let url = self.base_url.join("/api/quiz/negotiate")?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `POST /api/tts/convertToSpeech`, returning WAV bytes.
    pub async fn convert_to_speech(&self, text: &str) -> Result<Bytes, ClientError> {
        let url = self.base_url.join("/api/tts/convertToSpeech")?;
        let body = SpeechRequest {
            text: text.to_owned(),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        Ok(check_status(resp).await?.bytes().await?)
    }

    fn quiz_url(&self, quiz_id: &str, suffix: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&format!(
            "/api/quiz/{}{suffix}",
            urlencoding::encode(quiz_id)
        ))?)
    }
}

fn creation_form(request: &CreationRequest) -> Result<Form, ClientError> {
    let mut form = Form::new()
        .text(fields::QUIZ_NAME, request.quiz_name.clone())
        .text(fields::NUM_QUESTIONS, request.num_questions.to_string())
        .text(fields::TOPIC, request.topic.clone());
    if let Some(content) = &request.content {
        form = form.text(fields::CONTENT, content.clone());
    }
    for question_type in &request.question_types {
        form = form.text(fields::QUESTION_TYPES, question_type.as_str());
    }
    for file in &request.files {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        form = form.part(fields::FILES, part);
    }
    Ok(form)
}

#[async_trait]
impl QuizBackend for QuizClient {
    async fn login(&self, credentials: &Credentials) -> Result<UserProfile, BackendError> {
        Ok(QuizClient::login(self, credentials).await?)
    }

    async fn register(&self, credentials: &Credentials) -> Result<UserProfile, BackendError> {
        Ok(QuizClient::register(self, credentials).await?)
    }

    async fn me(&self) -> Result<UserProfile, BackendError> {
        Ok(QuizClient::me(self).await?)
    }

    async fn logout(&self) -> Result<(), BackendError> {
        Ok(QuizClient::logout(self).await?)
    }

    async fn list_quizzes(&self) -> Result<QuizList, BackendError> {
        Ok(QuizClient::list_quizzes(self).await?)
    }

    async fn create_quiz(&self, request: &CreationRequest) -> Result<JobAck, BackendError> {
        Ok(QuizClient::create_quiz(self, request).await?)
    }

    async fn negotiate(&self) -> Result<NegotiateResponse, BackendError> {
        Ok(QuizClient::negotiate(self).await?)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::objects::QuestionType;
    use crate::objects::creation::{MIME_PDF, UploadedFile};

    async fn client(server: &MockServer) -> QuizClient {
        QuizClient::new(Url::parse(&server.uri()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_login_cookie_is_sent_on_later_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "token=abc.def; Path=/; HttpOnly")
                    .set_body_json(serde_json::json!({"id": "u1", "username": "alice"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/quiz/all"))
            .and(header("cookie", "token=abc.def"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "own_quizzes": [{"id": "q1", "name": "History Quiz", "processed": true}],
                "shared_quizzes": []
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let user = client
            .login(&Credentials::new("alice", "secret"))
            .await
            .unwrap();
        assert_eq!(user.id, "u1");
        let list = client.list_quizzes().await.unwrap();
        assert!(list.contains("q1"));
    }

    #[tokio::test]
    async fn test_error_body_becomes_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/quiz/create"))
            .respond_with(ResponseTemplate::new(415).set_body_json(serde_json::json!({
                "error": "Unsupported file type: image/png"
            })))
            .mount(&server)
            .await;

        let request = CreationRequest {
            quiz_name: "History Quiz".into(),
            content: None,
            files: vec![UploadedFile::new("a.pdf", MIME_PDF, b"%PDF".to_vec())],
            num_questions: 5,
            topic: String::new(),
            question_types: vec![QuestionType::MultiChoice],
        };
        let err = QuizBackend::create_quiz(&client(&server).await, &request)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BackendError::Rejected {
                status: 415,
                message: "Unsupported file type: image/png".into()
            }
        );
    }

    #[tokio::test]
    async fn test_creation_form_carries_every_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/quiz/create"))
            .and(body_string_contains("name=\"quiz_name\""))
            .and(body_string_contains("name=\"files[]\"; filename=\"notes.pdf\""))
            .and(body_string_contains("fill-blanks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "q9", "name": "History Quiz"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = CreationRequest {
            quiz_name: "History Quiz".into(),
            content: Some("a".repeat(400)),
            files: vec![UploadedFile::new("notes.pdf", MIME_PDF, b"%PDF".to_vec())],
            num_questions: 5,
            topic: "Tudors".into(),
            question_types: vec![QuestionType::MultiChoice, QuestionType::FillBlanks],
        };
        let ack = client(&server).await.create_quiz(&request).await.unwrap();
        assert_eq!(ack.id, "q9");
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = QuizClient::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap();
        let err = QuizBackend::list_quizzes(&client).await.unwrap_err();
        assert_eq!(err.alert_message(), "Unable to connect to server");
    }

    #[tokio::test]
    async fn test_non_json_error_is_unexpected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;
        let err = QuizBackend::me(&client(&server).await).await.unwrap_err();
        assert!(matches!(err, BackendError::Unexpected(_)));
    }
}
