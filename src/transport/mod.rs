//! Submission Transport
//!
//! Authenticated delivery of a [`SubmissionPayload`] to the passport server.
//!
//! ## Response Handling
//!
//! ```text
//! send(payload, Idempotency-Key)
//!    ├── 2xx            → SubmissionReceipt
//!    ├── 401            → invalidate credential, re-authenticate once, resend once
//!    ├── 5xx / network  → exponential backoff, resend (same key) up to max_attempts
//!    └── other 4xx      → RemoteRejection (diagnostic verbatim), never retried
//! ```
//!
//! Resending is only safe because every send of one logical submission
//! carries the same idempotency key and the server deduplicates on it.
//!
//! The raw HTTP exchange sits behind [`PassportApi`] so that the retry and
//! re-authentication logic can be exercised against an in-memory server.

#[cfg(test)]
pub(crate) mod fake;
mod http;
mod receipt;
mod retry;
mod submit;

pub use http::HttpPassportApi;
pub use receipt::SubmissionReceipt;
pub use retry::RetryPolicy;
pub use submit::Transport;

use crate::config::AuthMethod;
use crate::error::TransportFailure;
use crate::payload::SubmissionPayload;
use std::future::Future;

/// Status code and body of an HTTP exchange that produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, verbatim
    pub body: String,
}

impl ApiResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// An exchange that produced no response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkError {
    /// [`TransportFailure::Timeout`] or [`TransportFailure::Network`]
    pub kind: TransportFailure,
    /// Description from the HTTP stack
    pub message: String,
}

impl NetworkError {
    /// Create a network error.
    pub fn new(kind: TransportFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one raw exchange with the passport server.
pub type ApiResult = std::result::Result<ApiResponse, NetworkError>;

/// Outbound contract with the passport server.
///
/// Implementations perform a single HTTP exchange per call and do not
/// interpret status codes; retries, re-authentication and error
/// classification happen in [`Transport`] and
/// [`SessionManager`](crate::session::SessionManager).
pub trait PassportApi: Send + Sync {
    /// Exchange credentials for a token response.
    fn login(&self, auth: &AuthMethod) -> impl Future<Output = ApiResult> + Send;

    /// Send a payload under a bearer token.
    fn submit(
        &self,
        bearer: &str,
        payload: &SubmissionPayload,
    ) -> impl Future<Output = ApiResult> + Send;
}
