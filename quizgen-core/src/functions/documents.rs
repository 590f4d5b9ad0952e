//! Job submitter for quiz creation.
//!
//! A validated request and the id of the user who asked for it are packed
//! into one multipart payload and handed to the `upload_documents` function.
//! The function answers once it has accepted the job; the finished quiz is
//! announced later over the realtime channel. Nothing is recorded locally.

use kanau::processor::Processor;
use quizgen_sdk::objects::creation::fields;
use quizgen_sdk::objects::{CreationRequest, JobAck};
use reqwest::multipart::{Form, Part};

use crate::framework::{FunctionError, FunctionService};

#[derive(Debug, Clone)]
pub struct SubmitCreationJob {
    pub request: CreationRequest,
    pub user_id: String,
}

impl SubmitCreationJob {
    fn into_form(self) -> Result<Form, FunctionError> {
        let SubmitCreationJob { request, user_id } = self;
        let mut form = Form::new()
            .text(fields::USER_ID, user_id)
            .text(fields::QUIZ_NAME, request.quiz_name)
            .text(fields::NUM_QUESTIONS, request.num_questions.to_string())
            .text(fields::TOPIC, request.topic);
        if let Some(content) = request.content {
            form = form.text(fields::CONTENT, content);
        }
        for question_type in request.question_types {
            form = form.text(fields::QUESTION_TYPES, question_type.as_str());
        }
        for file in request.files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)?;
            form = form.part(fields::FILES, part);
        }
        Ok(form)
    }
}

impl Processor<SubmitCreationJob> for FunctionService {
    type Output = JobAck;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:SubmitCreationJob")]
    async fn process(&self, job: SubmitCreationJob) -> Result<JobAck, FunctionError> {
        tracing::info!(
            user_id = %job.user_id,
            files = job.request.files.len(),
            has_content = job.request.content.is_some(),
            "submitting quiz creation job"
        );
        let form = job.into_form()?;
        let request = self.post("upload_documents")?.multipart(form);
        self.call_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use quizgen_sdk::objects::QuestionType;
    use quizgen_sdk::objects::creation::{MIME_DOCX, UploadedFile};
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::framework::test_support::{TOKEN, service};

    fn job() -> SubmitCreationJob {
        SubmitCreationJob {
            request: CreationRequest {
                quiz_name: "History Quiz".into(),
                content: Some("a".repeat(500)),
                files: vec![UploadedFile::new("notes.docx", MIME_DOCX, b"PK fake docx".to_vec())],
                num_questions: 10,
                topic: "Tudors".into(),
                question_types: vec![QuestionType::MultiChoice, QuestionType::ShortAnswer],
            },
            user_id: "u1".into(),
        }
    }

    #[tokio::test]
    async fn test_submit_sends_one_multipart_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload_documents"))
            .and(query_param("code", TOKEN))
            .and(body_string_contains("name=\"user_id\"\r\n\r\nu1"))
            .and(body_string_contains("name=\"quiz_name\"\r\n\r\nHistory Quiz"))
            .and(body_string_contains("name=\"num_questions\"\r\n\r\n10"))
            .and(body_string_contains("short-ans"))
            .and(body_string_contains("name=\"files[]\"; filename=\"notes.docx\""))
            .and(body_string_contains(MIME_DOCX))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "q1", "name": "History Quiz"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ack = service(&server).process(job()).await.unwrap();
        assert_eq!(
            ack,
            JobAck {
                id: "q1".into(),
                name: "History Quiz".into()
            }
        );
    }

    #[tokio::test]
    async fn test_deep_inspection_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload_documents"))
            .respond_with(
                ResponseTemplate::new(415)
                    .set_body_json(serde_json::json!({"error": "notes.docx is not a document"})),
            )
            .mount(&server)
            .await;

        let err = service(&server).process(job()).await.unwrap_err();
        assert_eq!(err.status(), Some(415));
        assert!(err.to_string().contains("notes.docx is not a document"));
    }

    #[tokio::test]
    async fn test_ack_must_be_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload_documents"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let err = service(&server).process(job()).await.unwrap_err();
        assert!(matches!(err, FunctionError::Decode(_)));
    }
}
