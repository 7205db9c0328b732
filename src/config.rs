//! Client configuration
//!
//! Everything the client needs to reach a passport server is passed in
//! explicitly through [`ClientConfig`]; there is no ambient or global state.
//! Configuration is validated when it is built, so a constructed client
//! never discovers a malformed URL or an empty study id mid-submission.
//!
//! ## Sources
//!
//! - Code: [`ClientConfig::builder`]
//! - Environment: [`ClientConfig::from_env`] (`PASSPORT_*` variables)
//! - JSON file contents: [`ClientConfig::from_json_str`]

use crate::payload::{StageTotalPolicy, SubmissionTarget};
use crate::transport::RetryPolicy;
use crate::{Error, Result};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable names read by [`ClientConfig::from_env`].
pub mod env {
    /// Base URL of the passport API
    pub const SERVER_URL: &str = "PASSPORT_SERVER_URL";
    /// Study identifier
    pub const STUDY_ID: &str = "PASSPORT_STUDY_ID";
    /// Organization identifier
    pub const ORGANIZATION_ID: &str = "PASSPORT_ORGANIZATION_ID";
    /// Username for password login
    pub const USERNAME: &str = "PASSPORT_USERNAME";
    /// Password for password login
    pub const PASSWORD: &str = "PASSPORT_PASSWORD";
    /// Offline connector secret (alternative to username/password)
    pub const CONNECTOR_SECRET: &str = "PASSPORT_CONNECTOR_SECRET";
    /// Per-request timeout in seconds
    pub const TIMEOUT_SECS: &str = "PASSPORT_TIMEOUT_SECS";
}

/// A string that must not appear in logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// How the client authenticates against the passport server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum AuthMethod {
    /// Username/password login
    Password {
        /// Account name
        username: String,
        /// Account password
        password: Secret,
    },
    /// Login with a long-lived offline connector secret
    ConnectorSecret {
        /// The connector secret issued by the server
        secret: Secret,
    },
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    server_url: Url,
    study_id: String,
    organization_id: String,
    auth: AuthMethod,
    request_timeout: Duration,
    retry: RetryPolicy,
    stage_total_policy: StageTotalPolicy,
}

impl ClientConfig {
    /// Create a builder with the required identifiers.
    #[must_use]
    pub fn builder(
        server_url: impl Into<String>,
        study_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder::new(server_url, study_id, organization_id)
    }

    /// Load configuration from `PASSPORT_*` environment variables.
    ///
    /// `PASSPORT_CONNECTOR_SECRET` takes precedence over
    /// `PASSPORT_USERNAME`/`PASSPORT_PASSWORD` when both are set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::validation(key, "environment variable is not set"))
        };

        let mut builder = Self::builder(
            required(env::SERVER_URL)?,
            required(env::STUDY_ID)?,
            required(env::ORGANIZATION_ID)?,
        );

        builder = if let Some(secret) = lookup(env::CONNECTOR_SECRET) {
            builder.connector_secret(secret)
        } else {
            builder.password(required(env::USERNAME)?, required(env::PASSWORD)?)
        };

        if let Some(raw) = lookup(env::TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::validation(env::TIMEOUT_SECS, format!("not a whole number of seconds: {raw}"))
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Parse configuration from a JSON document.
    ///
    /// ```json
    /// {
    ///   "server_url": "http://localhost:80/ai4hf/passport/api",
    ///   "study_id": "1",
    ///   "organization_id": "1",
    ///   "auth": {"method": "password", "username": "data_scientist", "password": "..."},
    ///   "request_timeout_secs": 30,
    ///   "max_attempts": 3,
    ///   "stage_total_policy": "reject_over_100"
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the document is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigFile =
            serde_json::from_str(json).map_err(|e| Error::validation("config", e.to_string()))?;

        let mut builder = Self::builder(file.server_url, file.study_id, file.organization_id);
        builder.auth = Some(file.auth);
        if let Some(secs) = file.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(attempts) = file.max_attempts {
            builder = builder.retry(RetryPolicy::default().with_max_attempts(attempts));
        }
        if let Some(policy) = file.stage_total_policy {
            builder = builder.stage_total_policy(policy);
        }
        builder.build()
    }

    /// Re-check all construction-time invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        validate_url(self.server_url.as_str())?;
        require_non_blank("study_id", &self.study_id)?;
        require_non_blank("organization_id", &self.organization_id)?;
        validate_auth(&self.auth)?;
        if self.request_timeout.is_zero() {
            return Err(Error::validation("request_timeout", "must be greater than zero"));
        }
        self.retry.validate()
    }

    /// Base URL of the passport API.
    #[must_use]
    pub const fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Study identifier submissions are filed under.
    #[must_use]
    pub fn study_id(&self) -> &str {
        &self.study_id
    }

    /// Organization identifier submissions are filed under.
    #[must_use]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Authentication method.
    #[must_use]
    pub const fn auth(&self) -> &AuthMethod {
        &self.auth
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Retry policy for transient transport failures.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// What to do when stage percentages exceed 100 in total.
    #[must_use]
    pub const fn stage_total_policy(&self) -> StageTotalPolicy {
        self.stage_total_policy
    }

    /// Study/organization pair bound to this configuration.
    #[must_use]
    pub fn target(&self) -> SubmissionTarget {
        SubmissionTarget::new(self.study_id.clone(), self.organization_id.clone())
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    server_url: String,
    study_id: String,
    organization_id: String,
    auth: Option<AuthMethod>,
    request_timeout: Duration,
    retry: RetryPolicy,
    stage_total_policy: StageTotalPolicy,
}

impl ClientConfigBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        server_url: impl Into<String>,
        study_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            study_id: study_id.into(),
            organization_id: organization_id.into(),
            auth: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            stage_total_policy: StageTotalPolicy::default(),
        }
    }

    /// Authenticate with username and password.
    #[must_use]
    pub fn password(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password {
            username: username.into(),
            password: Secret::new(password),
        });
        self
    }

    /// Authenticate with an offline connector secret.
    #[must_use]
    pub fn connector_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::ConnectorSecret {
            secret: Secret::new(secret),
        });
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the stage total policy.
    #[must_use]
    pub const fn stage_total_policy(mut self, policy: StageTotalPolicy) -> Self {
        self.stage_total_policy = policy;
        self
    }

    /// Validate and build the `ClientConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any field is missing or invalid.
    pub fn build(self) -> Result<ClientConfig> {
        let server_url = validate_url(&self.server_url)?;
        let auth = self
            .auth
            .ok_or_else(|| Error::validation("auth", "no credentials configured"))?;

        let config = ClientConfig {
            server_url,
            study_id: self.study_id,
            organization_id: self.organization_id,
            auth,
            request_timeout: self.request_timeout,
            retry: self.retry,
            stage_total_policy: self.stage_total_policy,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    server_url: String,
    study_id: String,
    organization_id: String,
    auth: AuthMethod,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    stage_total_policy: Option<StageTotalPolicy>,
}

fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::validation("server_url", format!("invalid URL `{raw}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::validation(
            "server_url",
            format!("unsupported scheme `{other}` (expected http or https)"),
        )),
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(())
}

fn validate_auth(auth: &AuthMethod) -> Result<()> {
    match auth {
        AuthMethod::Password { username, password } => {
            require_non_blank("auth.username", username)?;
            if password.is_blank() {
                return Err(Error::validation("auth.password", "must not be empty"));
            }
        }
        AuthMethod::ConnectorSecret { secret } => {
            if secret.is_blank() {
                return Err(Error::validation("auth.secret", "must not be empty"));
            }
        }
    }
    Ok(())
}
