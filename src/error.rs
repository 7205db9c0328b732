//! Error types for passport-capture
//!
//! Every failure tells the caller which of three things to do next:
//! fix the submitted data, try again later, or contact the server operator.

use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Transport-level failure classes surfaced by [`Error::Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The per-submission deadline (or a per-request timeout) elapsed.
    Timeout,
    /// Connection refused, reset, DNS failure, ...
    Network,
    /// The server answered 5xx on every attempt.
    ServerUnavailable,
    /// The server answered 2xx but the confirmation could not be decoded
    /// or does not echo the submission.
    MalformedResponse,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::ServerUnavailable => "server unavailable",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(name)
    }
}

/// What the caller should do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The submitted metadata or model is wrong; retrying will not help.
    FixData,
    /// A transient condition; the same submission may succeed later.
    RetryLater,
    /// Credentials or server-side configuration need attention.
    ContactOperator,
}

/// passport-capture error types
#[derive(Error, Debug)]
pub enum Error {
    /// The model object exposes no recognizable parameter introspection
    #[error("Unsupported model kind `{type_name}`: {reason}\nRegister an `Introspect` adapter for this type with `Extractor::register`")]
    UnsupportedModelKind {
        /// Rust type name of the rejected model object
        type_name: String,
        /// Why extraction failed
        reason: String,
    },

    /// Malformed or incomplete metadata, detected before any network call
    #[error("Validation failed for `{field}`: {message}")]
    Validation {
        /// Offending field path (e.g. `learning_stages[1].dataset_percentage`)
        field: String,
        /// Human-readable description
        message: String,
    },

    /// Credentials were rejected or the session could not be (re)established
    #[error("Authentication failed: {message}\nCheck the configured credentials and that the passport server is reachable")]
    Authentication {
        /// Description of the failure
        message: String,
        /// HTTP status returned by the server, if a response was received
        status: Option<u16>,
    },

    /// Network, timeout or server-unavailable failure after retries were exhausted
    #[error("Transport error ({kind}) after {attempts} attempt(s): {message}")]
    Transport {
        /// Failure class
        kind: TransportFailure,
        /// Number of submission attempts made
        attempts: u32,
        /// Description of the last failure
        message: String,
    },

    /// The server understood the request but refused it for domain reasons
    /// (any 4xx other than 401; 400/422 classify as [`ErrorCategory::FixData`])
    #[error("Submission rejected by passport server (HTTP {status}): {diagnostic}")]
    RemoteRejection {
        /// HTTP status code
        status: u16,
        /// Server diagnostic, verbatim
        diagnostic: String,
    },
}

impl Error {
    /// Build a [`Error::Validation`] for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build an [`Error::Authentication`] without a status code.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            status: None,
        }
    }

    /// Build an [`Error::Transport`].
    pub fn transport(kind: TransportFailure, attempts: u32, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            attempts,
            message: message.into(),
        }
    }

    /// Classify the error for the caller.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedModelKind { .. }
            | Self::Validation { .. }
            | Self::RemoteRejection {
                status: 400 | 422, ..
            } => ErrorCategory::FixData,
            Self::Transport {
                kind: TransportFailure::MalformedResponse,
                ..
            }
            | Self::Authentication { .. }
            | Self::RemoteRejection { .. } => ErrorCategory::ContactOperator,
            Self::Transport { .. } => ErrorCategory::RetryLater,
        }
    }

    /// Whether the transport retry loop treats this failure as transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                kind: TransportFailure::Timeout
                    | TransportFailure::Network
                    | TransportFailure::ServerUnavailable,
                ..
            }
        )
    }

    /// The server's diagnostic message, verbatim, when the server produced one.
    #[must_use]
    pub fn server_diagnostic(&self) -> Option<&str> {
        match self {
            Self::RemoteRejection { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } => *status,
            Self::RemoteRejection { status, .. } => Some(*status),
            _ => None,
        }
    }
}
