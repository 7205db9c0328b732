//! Retrying, re-authenticating submission loop

use super::{NetworkError, PassportApi, RetryPolicy, SubmissionReceipt};
use crate::config::AuthMethod;
use crate::error::TransportFailure;
use crate::payload::SubmissionPayload;
use crate::session::SessionManager;
use crate::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// Delivers payloads to the passport server.
///
/// Owns the [`SessionManager`] for its server, so every submission made
/// through one `Transport` shares one cached credential.
#[derive(Debug)]
pub struct Transport<A> {
    api: Arc<A>,
    session: SessionManager<A>,
    retry: RetryPolicy,
}

impl<A: PassportApi> Transport<A> {
    /// Create a transport that authenticates with `auth`.
    #[must_use]
    pub fn new(api: Arc<A>, auth: AuthMethod, retry: RetryPolicy) -> Self {
        let session = SessionManager::new(Arc::clone(&api), auth);
        Self {
            api,
            session,
            retry,
        }
    }

    /// The session used for submissions.
    #[must_use]
    pub const fn session(&self) -> &SessionManager<A> {
        &self.session
    }

    /// Retry policy for transient failures.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Submit `payload` and wait for the server's confirmation.
    ///
    /// Every send of this payload carries its idempotency key, so resends
    /// after a 5xx or network failure cannot create a second record.
    ///
    /// # Arguments
    ///
    /// * `payload` - Assembled submission
    /// * `deadline` - Upper bound for the whole call, retries and
    ///   re-authentication included; `None` waits for the retry budget
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if no credential can be obtained, or the
    ///   server rejects a freshly obtained one
    /// - [`Error::RemoteRejection`] for any other 4xx, diagnostic verbatim
    /// - [`Error::Transport`] once `max_attempts` transient failures have
    ///   been seen, on a malformed confirmation, or when `deadline` elapses
    pub async fn submit(
        &self,
        payload: &SubmissionPayload,
        deadline: Option<Duration>,
    ) -> Result<SubmissionReceipt> {
        let span = info_span!(
            "submit",
            idempotency_key = %payload.idempotency_key(),
            study_id = payload.study_id()
        );
        let attempts = AtomicU32::new(0);
        let send = self.send(payload, &attempts).instrument(span.clone());

        let Some(limit) = deadline else {
            return send.await;
        };

        // Dropping the timed-out future aborts the in-flight request
        match tokio::time::timeout(limit, send).await {
            Ok(result) => result,
            Err(_) => {
                let attempts = attempts.load(Ordering::SeqCst);
                span.in_scope(|| warn!(attempts, ?limit, "Submission deadline elapsed"));
                Err(Error::transport(
                    TransportFailure::Timeout,
                    attempts,
                    format!("submission deadline of {limit:?} elapsed"),
                ))
            }
        }
    }

    async fn send(&self, payload: &SubmissionPayload, attempts: &AtomicU32) -> Result<SubmissionReceipt> {
        let mut failures = 0;
        let mut reauthenticated = false;

        loop {
            let credential = self.session.get_valid_credential().await?;
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(attempt, generation = credential.generation(), "Sending submission");

            let failure = match self.api.submit(credential.bearer(), payload).await {
                Ok(response) if response.is_success() => {
                    let receipt =
                        SubmissionReceipt::from_confirmation(payload, &response.body, attempt)?;
                    info!(
                        record_id = receipt.record_id(),
                        attempts = attempt,
                        "Submission accepted"
                    );
                    return Ok(receipt);
                }
                Ok(response) if response.status == 401 => {
                    self.session.invalidate(&credential).await;
                    if reauthenticated {
                        warn!(attempt, "Fresh credential rejected");
                        return Err(Error::Authentication {
                            message: format!(
                                "credential rejected after re-authentication: {}",
                                response.body
                            ),
                            status: Some(401),
                        });
                    }
                    info!(attempt, "Credential rejected, re-authenticating");
                    reauthenticated = true;
                    continue;
                }
                Ok(response) if response.status >= 500 => NetworkError::new(
                    TransportFailure::ServerUnavailable,
                    format!("HTTP {}: {}", response.status, response.body),
                ),
                Ok(response) => {
                    warn!(status = response.status, "Submission rejected");
                    return Err(Error::RemoteRejection {
                        status: response.status,
                        diagnostic: response.body,
                    });
                }
                Err(e) => e,
            };

            failures += 1;
            if failures >= self.retry.max_attempts() {
                warn!(attempt, kind = %failure.kind, "Retries exhausted");
                return Err(Error::transport(failure.kind, attempt, failure.message));
            }

            let delay = self.retry.backoff(failures);
            warn!(
                attempt,
                kind = %failure.kind,
                ?delay,
                "Transient submission failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::descriptor::ModelDescriptor;
    use crate::metadata::{LearningStage, LearningStageType, ModelRecord};
    use crate::payload::{Assembler, SubmissionTarget};
    use crate::transport::fake::{confirmation, ScriptedApi};
    use crate::transport::ApiResponse;
    use std::collections::BTreeMap;

    fn payload() -> SubmissionPayload {
        Assembler::new(SubmissionTarget::new("1", "1"))
            .assemble(
                &ModelDescriptor::new("DecisionTreeClassifier", BTreeMap::new(), "scikit-learn"),
                &ModelRecord::new("heart-failure-dt"),
                &[
                    LearningStage::new(LearningStageType::Training, 80.0),
                    LearningStage::new(LearningStageType::Test, 20.0),
                ],
                &[],
            )
            .unwrap()
    }

    fn transport(api: ScriptedApi) -> (Arc<ScriptedApi>, Transport<ScriptedApi>) {
        let api = Arc::new(api);
        let auth = AuthMethod::ConnectorSecret {
            secret: Secret::new("connector"),
        };
        let retry = RetryPolicy::default()
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5));
        let transport = Transport::new(Arc::clone(&api), auth, retry);
        (api, transport)
    }

    fn unavailable() -> crate::transport::ApiResult {
        Ok(ApiResponse::new(503, "Service Unavailable"))
    }

    // ========================================================================
    // Success
    // ========================================================================

    #[tokio::test]
    async fn test_first_attempt_success() {
        let (api, transport) = transport(ScriptedApi::new());
        let payload = payload();

        let receipt = transport.submit(&payload, None).await.unwrap();

        assert_eq!(receipt.attempts(), 1);
        assert_eq!(receipt.study_id(), "1");
        assert_eq!(receipt.model_name(), "heart-failure-dt");
        assert_eq!(api.login_calls(), 1);
        assert_eq!(api.sent()[0].0, "token-1");
    }

    #[tokio::test]
    async fn test_session_is_shared_across_submissions() {
        let (api, transport) = transport(ScriptedApi::new());

        transport.submit(&payload(), None).await.unwrap();
        transport.submit(&payload(), None).await.unwrap();

        assert_eq!(api.login_calls(), 1);
        assert_eq!(api.sent().len(), 2);
    }

    // ========================================================================
    // Transient failures
    // ========================================================================

    #[tokio::test]
    async fn test_three_503_surface_transport_error() {
        let api = ScriptedApi::new();
        for _ in 0..3 {
            api.push_submit(unavailable());
        }
        let (api, transport) = transport(api);

        let err = transport.submit(&payload(), None).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Transport {
                kind: TransportFailure::ServerUnavailable,
                attempts: 3,
                ..
            }
        ));
        assert_eq!(api.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_503_then_success_reuses_idempotency_key() {
        let api = ScriptedApi::new();
        api.push_submit(unavailable());
        let (api, transport) = transport(api);
        let payload = payload();

        let receipt = transport.submit(&payload, None).await.unwrap();

        let sent = api.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1.idempotency_key(), payload.idempotency_key());
        assert_eq!(sent[1].1.idempotency_key(), payload.idempotency_key());
        assert_eq!(receipt.idempotency_key(), payload.idempotency_key());
        assert_eq!(receipt.attempts(), 2);
    }

    #[tokio::test]
    async fn test_network_error_is_retried() {
        let api = ScriptedApi::new();
        api.push_submit(Err(NetworkError::new(
            TransportFailure::Network,
            "connection reset",
        )));
        let (_api, transport) = transport(api);

        assert_eq!(transport.submit(&payload(), None).await.unwrap().attempts(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_network_errors_keep_kind() {
        let api = ScriptedApi::new();
        for _ in 0..3 {
            api.push_submit(Err(NetworkError::new(TransportFailure::Timeout, "timed out")));
        }
        let (_api, transport) = transport(api);

        let err = transport.submit(&payload(), None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport {
                kind: TransportFailure::Timeout,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    // ========================================================================
    // Rejections
    // ========================================================================

    #[tokio::test]
    async fn test_401_reauthenticates_once() {
        let api = ScriptedApi::new();
        api.push_submit(Ok(ApiResponse::new(401, "")));
        let (api, transport) = transport(api);

        let receipt = transport.submit(&payload(), None).await.unwrap();

        let sent = api.sent();
        assert_eq!(api.login_calls(), 2);
        assert_eq!(sent[0].0, "token-1");
        assert_eq!(sent[1].0, "token-2");
        assert_eq!(receipt.attempts(), 2);
    }

    #[tokio::test]
    async fn test_second_401_is_authentication_error() {
        let api = ScriptedApi::new();
        api.push_submit(Ok(ApiResponse::new(401, "")));
        api.push_submit(Ok(ApiResponse::new(401, "token revoked")));
        let (api, transport) = transport(api);

        let err = transport.submit(&payload(), None).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Authentication {
                status: Some(401),
                ..
            }
        ));
        assert_eq!(api.login_calls(), 2);
        assert_eq!(api.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_4xx_is_verbatim_rejection() {
        let diagnostic = r#"{"error": "Unknown evaluation measure type FOO"}"#;
        let api = ScriptedApi::new();
        api.push_submit(Ok(ApiResponse::new(422, diagnostic)));
        let (api, transport) = transport(api);

        let err = transport.submit(&payload(), None).await.unwrap_err();

        assert_eq!(err.server_diagnostic(), Some(diagnostic));
        assert_eq!(err.status(), Some(422));
        assert_eq!(api.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_confirmation_is_not_retried() {
        let api = ScriptedApi::new();
        api.push_submit(Ok(ApiResponse::new(200, "OK")));
        let (api, transport) = transport(api);

        let err = transport.submit(&payload(), None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport {
                kind: TransportFailure::MalformedResponse,
                ..
            }
        ));
        assert_eq!(api.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_login_surfaces_before_send() {
        let api = ScriptedApi::new();
        api.push_login(Ok(ApiResponse::new(401, "bad secret")));
        let (api, transport) = transport(api);

        let err = transport.submit(&payload(), None).await.unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
        assert!(api.sent().is_empty());
    }

    // ========================================================================
    // Deadline
    // ========================================================================

    #[tokio::test]
    async fn test_deadline_elapses() {
        let api = ScriptedApi::new().with_submit_delay(Duration::from_millis(500));
        let (_api, transport) = transport(api);

        let err = transport
            .submit(&payload(), Some(Duration::from_millis(50)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport {
                kind: TransportFailure::Timeout,
                attempts: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_deadline_not_reached() {
        let payload = payload();
        let api = ScriptedApi::new();
        api.push_submit(Ok(confirmation(&payload)));
        let (_api, transport) = transport(api);

        let receipt = transport
            .submit(&payload, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(receipt.attempts(), 1);
    }
}
