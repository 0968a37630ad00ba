use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::User;

const LOGIN: &str = "/auth/login";

impl ApiClient {
    /// Register or look up the user behind the current token.
    pub async fn login(&self) -> Result<User, ApiError> {
        let user: User = self.post::<(), _>(LOGIN, None).await?.data(LOGIN)?;
        info!(user = %user.email, "Logged in");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::tests::client_for;

    #[tokio::test]
    async fn test_login_returns_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Success": true,
                "Data": {"ID": "uid-1", "Email": "ada@example.com"},
                "Message": "user Exists"
            })))
            .mount(&mock_server)
            .await;

        let user = client_for(&mock_server).login().await.unwrap();
        assert_eq!(user.id, "uid-1");
        assert_eq!(user.email, "ada@example.com");
    }
}
