//! Access to the external function service.
//!
//! Storage of users and quizzes, question generation and speech synthesis
//! all live behind one HTTP function host. [`FunctionService`] is the single
//! way this crate reaches it; each remote function is a query type with a
//! `Processor` implementation in [`crate::functions`].

use bytes::Bytes;
use quizgen_sdk::objects::ErrorResponse;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::FunctionServiceConfig;

/// Errors from a function call.
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    /// The function host could not be reached or the call timed out.
    #[error("function service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The function answered with a non-2xx status.
    #[error("function service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A 2xx response whose body is not what the function promises.
    #[error("unexpected function service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid function url: {0}")]
    Url(#[from] url::ParseError),
}

impl FunctionError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FunctionError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Client for the external function host.
///
/// Cheap to clone; build one per request from the current config so a
/// reloaded token or URL takes effect immediately.
#[derive(Debug, Clone)]
pub struct FunctionService {
    http: reqwest::Client,
    config: FunctionServiceConfig,
}

impl FunctionService {
    pub fn new(http: reqwest::Client, config: FunctionServiceConfig) -> Self {
        Self { http, config }
    }

    pub(crate) fn url(&self, function: &str) -> Result<Url, FunctionError> {
        Ok(self.config.function_url(function)?)
    }

    pub(crate) fn get(&self, function: &str) -> Result<RequestBuilder, FunctionError> {
        Ok(self
            .http
            .get(self.url(function)?)
            .timeout(self.config.timeout))
    }

    pub(crate) fn post(&self, function: &str) -> Result<RequestBuilder, FunctionError> {
        Ok(self
            .http
            .post(self.url(function)?)
            .timeout(self.config.timeout))
    }

    pub(crate) fn delete(&self, function: &str) -> Result<RequestBuilder, FunctionError> {
        Ok(self
            .http
            .delete(self.url(function)?)
            .timeout(self.config.timeout))
    }

    /// Send and decode a JSON response.
    pub(crate) async fn call_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FunctionError> {
        let bytes = self.call_bytes(request).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send and return the raw response body.
    pub(crate) async fn call_bytes(&self, request: RequestBuilder) -> Result<Bytes, FunctionError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FunctionError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response.bytes().await?)
    }
}

/// Pull the `error` field out of an error body, falling back to the body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_owned(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(error_message(r#"{"error":"Username not found"}"#), "Username not found");
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
    }
}
