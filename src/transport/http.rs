//! reqwest-backed passport API

use super::{ApiResponse, ApiResult, NetworkError, PassportApi};
use crate::config::{AuthMethod, ClientConfig};
use crate::error::TransportFailure;
use crate::payload::SubmissionPayload;
use crate::{Error, Result};
use serde::Serialize;

/// Header carrying the submission's idempotency key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const LOGIN_PATH: &str = "user/login";
const CONNECTOR_LOGIN_PATH: &str = "user/connector/login";
const SUBMISSION_PATH: &str = "submission";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// HTTP implementation of [`PassportApi`].
///
/// Endpoints, relative to the configured server URL:
///
/// | Call     | Request                                                    |
/// |----------|------------------------------------------------------------|
/// | login    | `POST user/login` `{username, password}`                   |
/// | login    | `POST user/connector/login` (body: connector secret)       |
/// | submit   | `POST submission?studyId=..` + bearer + `Idempotency-Key`  |
#[derive(Debug, Clone)]
pub struct HttpPassportApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPassportApi {
    /// Create a client for the server in `config`, applying its request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be initialized.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("passport-capture/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::transport(TransportFailure::Network, 0, e.to_string()))?;

        Ok(Self::with_client(client, config.server_url().as_str()))
    }

    /// Wrap an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn exchange(request: reqwest::RequestBuilder) -> ApiResult {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_error)?;
        Ok(ApiResponse { status, body })
    }
}

impl PassportApi for HttpPassportApi {
    async fn login(&self, auth: &AuthMethod) -> ApiResult {
        let request = match auth {
            AuthMethod::Password { username, password } => self
                .client
                .post(self.endpoint(LOGIN_PATH))
                .json(&LoginRequest {
                    username,
                    password: password.expose(),
                }),
            AuthMethod::ConnectorSecret { secret } => self
                .client
                .post(self.endpoint(CONNECTOR_LOGIN_PATH))
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(secret.expose().to_string()),
        };

        Self::exchange(request).await
    }

    async fn submit(&self, bearer: &str, payload: &SubmissionPayload) -> ApiResult {
        let request = self
            .client
            .post(self.endpoint(SUBMISSION_PATH))
            .query(&[("studyId", payload.study_id())])
            .bearer_auth(bearer)
            .header(IDEMPOTENCY_HEADER, payload.idempotency_key().to_string())
            .json(payload);

        Self::exchange(request).await
    }
}

fn network_error(e: reqwest::Error) -> NetworkError {
    let kind = if e.is_timeout() {
        TransportFailure::Timeout
    } else {
        TransportFailure::Network
    };
    NetworkError::new(kind, e.to_string())
}
