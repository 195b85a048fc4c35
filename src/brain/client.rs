use std::time::Duration;

use reqwest::Client;

use super::error::BrainError;
use super::types::{Credentials, PollResponse, SubmitResponse};

/// Transport seam for the submission protocol, so the state machine and the
/// batch driver can run against scripted responses in tests.
pub trait SubmitTransport {
    async fn submit_alpha(&self, alpha_id: &str) -> Result<SubmitResponse, BrainError>;
    async fn poll_alpha(&self, alpha_id: &str) -> Result<PollResponse, BrainError>;
}

/// Authenticated HTTP client for the Brain platform.
pub struct BrainClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl BrainClient {
    /// Create a client for the given base URL (the production API by
    /// default, a mock server in tests).
    pub fn new(credentials: Credentials, base_url: String) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// Establish the session. Any status other than 200/201 is fatal.
    pub async fn authenticate(&self) -> Result<(), BrainError> {
        let response = self
            .http
            .post(format!("{}/authentication", self.base_url))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;
        match response.status().as_u16() {
            200 | 201 => Ok(()),
            status => Err(BrainError::AuthRejected { status }),
        }
    }
}

impl SubmitTransport for BrainClient {
    async fn submit_alpha(&self, alpha_id: &str) -> Result<SubmitResponse, BrainError> {
        let response = self
            .http
            .post(format!("{}/alphas/{}/submit", self.base_url, alpha_id))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;
        Ok(SubmitResponse {
            status: response.status().as_u16(),
        })
    }

    async fn poll_alpha(&self, alpha_id: &str) -> Result<PollResponse, BrainError> {
        let response = self
            .http
            .get(format!("{}/alphas/{}/submit", self.base_url, alpha_id))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .unwrap_or(0.0);
        let body = response.text().await.unwrap_or_default();
        Ok(PollResponse {
            status,
            retry_after,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_credentials() -> Credentials {
        Credentials {
            username: "trader42".into(),
            password: "hunter2".into(),
        }
    }

    fn client_for(server: &MockServer) -> BrainClient {
        BrainClient::new(test_credentials(), server.uri())
    }

    #[tokio::test]
    async fn authenticate_accepts_200_and_201() {
        for status in [200u16, 201] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/authentication"))
                .and(header_exists("authorization"))
                .respond_with(ResponseTemplate::new(status))
                .expect(1)
                .mount(&server)
                .await;

            let client = client_for(&server);
            client.authenticate().await.unwrap();
        }
    }

    #[tokio::test]
    async fn authenticate_rejects_other_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/authentication"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(err, BrainError::AuthRejected { status: 401 }));
    }

    #[tokio::test]
    async fn submit_reports_the_raw_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alphas/a1b2c3/submit"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.submit_alpha("a1b2c3").await.unwrap();
        assert_eq!(response.status, 403);
    }

    #[tokio::test]
    async fn poll_parses_fractional_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alphas/a1b2c3/submit"))
            .respond_with(ResponseTemplate::new(200).insert_header("Retry-After", "2.5"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.poll_alpha("a1b2c3").await.unwrap();
        assert_eq!(response.retry_after, 2.5);
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn poll_without_retry_after_resolves_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alphas/a1b2c3/submit"))
            .respond_with(
                ResponseTemplate::new(409).set_body_string(r#"{"is": {"checks": []}}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.poll_alpha("a1b2c3").await.unwrap();
        assert_eq!(response.retry_after, 0.0);
        assert_eq!(response.status, 409);
        assert_eq!(response.body, r#"{"is": {"checks": []}}"#);
    }

    #[tokio::test]
    async fn poll_ignores_garbage_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/alphas/a1b2c3/submit"))
            .respond_with(ResponseTemplate::new(200).insert_header("Retry-After", "soon"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.poll_alpha("a1b2c3").await.unwrap();
        assert_eq!(response.retry_after, 0.0);
    }
}
