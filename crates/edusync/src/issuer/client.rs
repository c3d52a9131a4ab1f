//! Credential issuer HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use super::error::{IssuerError, IssuerResult};
use super::types::{ErrorBody, LoginRequest, LoginResponse};

/// Default login endpoint path.
pub const DEFAULT_LOGIN_PATH: &str = "/api/StudentAccount/Login";

/// Anything that can exchange credentials for a signed token.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, request: &LoginRequest) -> IssuerResult<LoginResponse>;
}

/// Client for the credential issuance endpoint.
#[derive(Debug, Clone)]
pub struct HttpIssuer {
    /// HTTP client.
    client: Client,
    /// Base URL (e.g., "http://localhost:5000").
    base_url: String,
    /// Login endpoint path.
    login_path: String,
}

impl HttpIssuer {
    /// Create a new issuer client.
    pub fn new(
        base_url: impl Into<String>,
        login_path: impl Into<String>,
        timeout: Duration,
    ) -> IssuerResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login_path: login_path.into(),
        })
    }

    /// Full login endpoint URL.
    pub fn login_url(&self) -> String {
        if self.login_path.starts_with('/') {
            format!("{}{}", self.base_url, self.login_path)
        } else {
            format!("{}/{}", self.base_url, self.login_path)
        }
    }

    /// Map a non-success response to an error, keeping the server's message.
    async fn rejection(response: reqwest::Response) -> IssuerError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .or_else(|| {
                let text = body.trim();
                (!text.is_empty() && text.len() <= 200 && !text.starts_with('{'))
                    .then(|| text.to_string())
            })
            .unwrap_or_else(|| default_message(status));

        IssuerError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

fn default_message(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
            "Invalid email or password".to_string()
        }
        _ => format!("Request failed with status code {}", status.as_u16()),
    }
}

#[async_trait]
impl CredentialIssuer for HttpIssuer {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn issue(&self, request: &LoginRequest) -> IssuerResult<LoginResponse> {
        let url = self.login_url();
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    IssuerError::ConnectionFailed {
                        url: url.clone(),
                        message: e.to_string(),
                    }
                } else {
                    IssuerError::RequestFailed(e)
                }
            })?;

        let status = response.status();
        debug!("issuer responded {}", status);
        if !status.is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| IssuerError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let issuer = HttpIssuer::new(
            "http://localhost:5000/",
            DEFAULT_LOGIN_PATH,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(issuer.base_url, "http://localhost:5000");
        assert_eq!(
            issuer.login_url(),
            "http://localhost:5000/api/StudentAccount/Login"
        );
    }

    #[test]
    fn test_login_url_without_leading_slash() {
        let issuer =
            HttpIssuer::new("http://issuer", "auth/login", Duration::from_secs(5)).unwrap();
        assert_eq!(issuer.login_url(), "http://issuer/auth/login");
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(
            default_message(StatusCode::UNAUTHORIZED),
            "Invalid email or password"
        );
        assert_eq!(
            default_message(StatusCode::INTERNAL_SERVER_ERROR),
            "Request failed with status code 500"
        );
    }
}
