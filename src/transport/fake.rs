//! Scripted in-memory passport server for unit tests

use super::{ApiResponse, ApiResult, PassportApi};
use crate::config::AuthMethod;
use crate::payload::SubmissionPayload;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays queued responses; falls back to a valid token / an echoing
/// confirmation once a queue runs dry.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    logins: Mutex<VecDeque<ApiResult>>,
    submits: Mutex<VecDeque<ApiResult>>,
    login_calls: AtomicUsize,
    sent: Mutex<Vec<(String, SubmissionPayload)>>,
    login_delay: Duration,
    submit_delay: Duration,
}

impl ScriptedApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub(crate) fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub(crate) fn push_login(&self, result: ApiResult) {
        self.logins.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_token(&self, access_token: &str, expires_in: i64) {
        self.push_login(Ok(token(access_token, expires_in)));
    }

    pub(crate) fn push_submit(&self, result: ApiResult) {
        self.submits.lock().unwrap().push_back(result);
    }

    pub(crate) fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    /// `(bearer, payload)` of every submit call, in order.
    pub(crate) fn sent(&self) -> Vec<(String, SubmissionPayload)> {
        self.sent.lock().unwrap().clone()
    }
}

pub(crate) fn token(access_token: &str, expires_in: i64) -> ApiResponse {
    ApiResponse::new(
        200,
        format!(
            r#"{{"access_token": "{access_token}", "expires_in": {expires_in}, "token_type": "Bearer"}}"#
        ),
    )
}

pub(crate) fn confirmation(payload: &SubmissionPayload) -> ApiResponse {
    ApiResponse::new(
        201,
        serde_json::json!({
            "recordId": format!("rec-{}", payload.idempotency_key()),
            "studyId": payload.study_id(),
            "organizationId": payload.organization_id(),
            "modelName": payload.model_name(),
        })
        .to_string(),
    )
}

impl PassportApi for ScriptedApi {
    async fn login(&self, _auth: &AuthMethod) -> ApiResult {
        let call = self.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.login_delay).await;
        let scripted = self.logins.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(token(&format!("token-{call}"), 300)))
    }

    async fn submit(&self, bearer: &str, payload: &SubmissionPayload) -> ApiResult {
        self.sent
            .lock()
            .unwrap()
            .push((bearer.to_string(), payload.clone()));
        tokio::time::sleep(self.submit_delay).await;
        let scripted = self.submits.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(confirmation(payload)))
    }
}
