use kanau::processor::Processor;
use quizgen_sdk::objects::{Credentials, UserProfile};

use crate::framework::{FunctionError, FunctionService};

/// Check a username and password against the store.
#[derive(Debug, Clone)]
pub struct UserLogin {
    pub credentials: Credentials,
}

impl Processor<UserLogin> for FunctionService {
    type Output = UserProfile;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:UserLogin")]
    async fn process(&self, query: UserLogin) -> Result<UserProfile, FunctionError> {
        let request = self.post("user_login")?.json(&query.credentials);
        self.call_json(request).await
    }
}

/// Create a user.
#[derive(Debug, Clone)]
pub struct UserRegister {
    pub credentials: Credentials,
}

impl Processor<UserRegister> for FunctionService {
    type Output = UserProfile;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:UserRegister")]
    async fn process(&self, query: UserRegister) -> Result<UserProfile, FunctionError> {
        let request = self.post("user_register")?.json(&query.credentials);
        self.call_json(request).await
    }
}

#[derive(Debug, Clone)]
pub struct GetUser {
    pub user_id: String,
}

impl Processor<GetUser> for FunctionService {
    type Output = UserProfile;
    type Error = FunctionError;
    #[tracing::instrument(skip_all, err, name = "FN:GetUser")]
    async fn process(&self, query: GetUser) -> Result<UserProfile, FunctionError> {
        let request = self.get("user_get")?.query(&[("id", &query.user_id)]);
        self.call_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::framework::test_support::{TOKEN, service};

    #[tokio::test]
    async fn test_login_posts_credentials_with_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user_login"))
            .and(query_param("code", TOKEN))
            .and(body_json(serde_json::json!({"username": "alice", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "u1", "username": "alice"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let user = service(&server)
            .process(UserLogin {
                credentials: Credentials::new("alice", "pw"),
            })
            .await
            .unwrap();
        assert_eq!(user.id, "u1");
    }

    #[tokio::test]
    async fn test_error_status_keeps_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user_get"))
            .and(query_param("id", "nobody"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "no such user"})),
            )
            .mount(&server)
            .await;

        let err = service(&server)
            .process(GetUser {
                user_id: "nobody".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FunctionError::Status { status: 404, ref message } if message == "no such user"
        ));
    }
}
