//! Credential - cached bearer token and its lifetime

use crate::config::Secret;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// Lifetime assumed when the server omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 300;

/// Upper bound on how early a token is considered expired.
const MAX_SKEW_SECS: i64 = 30;

/// Token response of the passport login endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    pub(crate) fn parse(body: &str) -> Result<Self> {
        let token: Self = serde_json::from_str(body)
            .map_err(|e| Error::authentication(format!("malformed token response: {e}")))?;
        if token.access_token.is_empty() {
            return Err(Error::authentication("token response carries an empty access token"));
        }
        Ok(token)
    }
}

/// A session credential obtained from one authentication round-trip.
///
/// Every credential carries the generation number of the login that
/// produced it, so a rejection reported against an old credential cannot
/// evict a newer one.
#[derive(Clone)]
pub struct Credential {
    access_token: Secret,
    token_type: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    generation: u64,
}

impl Credential {
    pub(crate) fn from_token(token: TokenResponse, issued_at: DateTime<Utc>, generation: u64) -> Self {
        let lifetime = token.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS).max(0);
        // Renew early, but never more than half the lifetime early
        let skew = (lifetime / 2).min(MAX_SKEW_SECS);

        Self {
            access_token: Secret::new(token.access_token),
            token_type: token.token_type.unwrap_or_else(|| "Bearer".to_string()),
            issued_at,
            expires_at: issued_at + Duration::seconds(lifetime - skew),
            generation,
        }
    }

    /// The bearer token.
    #[must_use]
    pub fn bearer(&self) -> &str {
        self.access_token.expose()
    }

    /// Token type reported by the server (normally `Bearer`).
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// When the login completed.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// When the credential stops being used (already includes the renewal margin).
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Login sequence number that produced this credential.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Check whether the credential must be renewed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check whether the credential must be renewed now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
