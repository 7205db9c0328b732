//! Session Manager
//!
//! Owns the passport session: logs in once, caches the resulting
//! [`Credential`], and renews it when it expires or a submission reports it
//! rejected.
//!
//! ## State Machine
//!
//! ```text
//! UNAUTHENTICATED ──login──▶ AUTHENTICATED
//!        ▲                        │
//!        └──── expiry / 401 ──────┘
//! ```
//!
//! ## Concurrency
//!
//! Reading the cached credential only takes a shared lock. Renewal goes
//! through a single-flight guard: callers that find the credential stale
//! queue on the guard, and whoever acquires it first re-checks the cache
//! before logging in. Callers queued behind a successful renewal pick up
//! the fresh credential instead of logging in again. Submissions
//! themselves never hold the guard.

mod credential;

pub use credential::Credential;

use crate::config::AuthMethod;
use crate::transport::PassportApi;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use credential::TokenResponse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable credential (never logged in, expired, or invalidated)
    Unauthenticated,
    /// A credential is cached and valid until `expires_at`
    Authenticated {
        /// Renewal deadline of the cached credential
        expires_at: DateTime<Utc>,
    },
}

/// Caches the session credential for one passport server.
///
/// Shared by every submission made through one client; all methods take
/// `&self`.
pub struct SessionManager<A> {
    api: Arc<A>,
    auth: AuthMethod,
    cached: RwLock<Option<Arc<Credential>>>,
    refresh: Mutex<()>,
    generation: AtomicU64,
    round_trips: AtomicU64,
}

impl<A: PassportApi> SessionManager<A> {
    /// Create an unauthenticated session. No network call is made.
    #[must_use]
    pub fn new(api: Arc<A>, auth: AuthMethod) -> Self {
        Self {
            api,
            auth,
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
            generation: AtomicU64::new(0),
            round_trips: AtomicU64::new(0),
        }
    }

    /// Log in now, replacing any cached credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the server rejects the
    /// credentials, cannot be reached, or answers with an unusable token.
    pub async fn authenticate(&self) -> Result<Arc<Credential>> {
        let _guard = self.refresh.lock().await;
        self.login().await
    }

    /// Return the cached credential, logging in first if there is none or
    /// it has expired.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if a required login fails.
    pub async fn get_valid_credential(&self) -> Result<Arc<Credential>> {
        if let Some(credential) = self.current().await {
            return Ok(credential);
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have renewed while we waited
        if let Some(credential) = self.current().await {
            debug!(generation = credential.generation(), "Reusing renewed credential");
            return Ok(credential);
        }
        self.login().await
    }

    /// Drop `stale` from the cache after the server rejected it.
    ///
    /// No-op when the cache already holds a newer credential, so a late
    /// rejection cannot evict a renewal made by a concurrent submission.
    pub async fn invalidate(&self, stale: &Credential) {
        let mut cached = self.cached.write().await;
        if cached
            .as_ref()
            .is_some_and(|c| c.generation() == stale.generation())
        {
            debug!(generation = stale.generation(), "Invalidating rejected credential");
            *cached = None;
        }
    }

    /// Current state of the session.
    pub async fn state(&self) -> SessionState {
        match self.current().await {
            Some(credential) => SessionState::Authenticated {
                expires_at: credential.expires_at(),
            },
            None => SessionState::Unauthenticated,
        }
    }

    /// Number of login round-trips made so far, failed ones included.
    #[must_use]
    pub fn authentication_count(&self) -> u64 {
        self.round_trips.load(Ordering::SeqCst)
    }

    async fn current(&self) -> Option<Arc<Credential>> {
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|c| !c.is_expired())
            .cloned()
    }

    /// Callers must hold the refresh guard.
    async fn login(&self) -> Result<Arc<Credential>> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);

        let response = self.api.login(&self.auth).await.map_err(|e| {
            warn!(kind = %e.kind, "Passport server unreachable during login");
            Error::authentication(format!("passport server unreachable ({}): {}", e.kind, e.message))
        })?;

        if !response.is_success() {
            warn!(status = response.status, "Login rejected");
            return Err(Error::Authentication {
                message: format!("login rejected: {}", response.body),
                status: Some(response.status),
            });
        }

        let token = TokenResponse::parse(&response.body)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let credential = Arc::new(Credential::from_token(token, Utc::now(), generation));
        *self.cached.write().await = Some(Arc::clone(&credential));

        info!(
            generation,
            expires_at = %credential.expires_at(),
            "Authenticated with passport server"
        );
        Ok(credential)
    }
}

impl<A> std::fmt::Debug for SessionManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("auth", &self.auth)
            .field("round_trips", &self.round_trips.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
