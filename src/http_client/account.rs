use reqwest::StatusCode;
use serde::Deserialize;
use log::debug;

use super::{HttpClient, HttpClientError, Result};

const AUTH_PATH: &str = "/api/v2/auth";

#[derive(Deserialize)]
struct AuthResponse {
    data: Session
}

/// identity and access token issued by the service
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    pub token: String
}

impl HttpClient {
    /// exchange an email and password for an access token
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session> {
        debug!("Authenticating {}", email);
        let form_data = [
            ("user[email]", email),
            ("user[password]", password)
        ];

        let res = self.client
            .post(self.endpoint(AUTH_PATH))
            .form(&form_data[..])
            .send()
            .await?;

        if res.status() != StatusCode::OK {
            debug!("Authentication rejected with status {}", res.status());
            return Err(HttpClientError::AuthenticationFailed);
        }

        let body: AuthResponse = res.json().await.map_err(|e| {
            debug!("Could not decode auth response: {}", e);
            HttpClientError::UnexpectedResponse("expected data.email and data.token")
        })?;

        Ok(body.data)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn authenticate_returns_session() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/auth"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("user%5Bemail%5D=a%40example.com"))
            .and(body_string_contains("user%5Bpassword%5D=pw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "email": "a@example.com", "token": "tok123" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::init(mock_server.uri());
        let session = client.authenticate("a@example.com", "pw").await.unwrap();

        assert_eq!(session, Session { email: "a@example.com".into(), token: "tok123".into() });
    }

    #[tokio::test]
    async fn non_ok_status_is_generic_failure() {
        let mock_server = MockServer::start().await;
        for status in [401, 403, 500] {
            mock_server.reset().await;
            Mock::given(method("POST"))
                .and(path("/api/v2/auth"))
                .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": "nope" })))
                .mount(&mock_server)
                .await;

            let client = HttpClient::init(mock_server.uri());
            let result = client.authenticate("a@example.com", "wrong").await;
            assert!(matches!(result, Err(HttpClientError::AuthenticationFailed)), "status {status}");
        }
    }

    #[tokio::test]
    async fn ok_without_data_is_unexpected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "email": "a@example.com" })))
            .mount(&mock_server)
            .await;

        let client = HttpClient::init(mock_server.uri());
        assert!(matches!(
            client.authenticate("a@example.com", "pw").await,
            Err(HttpClientError::UnexpectedResponse(_))
        ));
    }
}
