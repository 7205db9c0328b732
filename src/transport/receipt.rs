//! Submission Receipt - decoded server confirmation

use crate::error::TransportFailure;
use crate::payload::{IdempotencyKey, SubmissionPayload};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Proof that the passport server accepted a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    record_id: String,
    idempotency_key: IdempotencyKey,
    study_id: String,
    organization_id: String,
    model_name: String,
    attempts: u32,
    accepted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    /// Decode the server's confirmation body for `payload`.
    ///
    /// The confirmation must carry a record id (`recordId`, `modelId` or `id`).
    /// Study, organization and model name are taken from the echo when
    /// present (`studyId`, `organizationId`, `modelName`, `name` or
    /// `model.name`) and must match what was submitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] with [`TransportFailure::MalformedResponse`]
    /// if the body is not JSON, has no record id, or echoes different values.
    pub fn from_confirmation(payload: &SubmissionPayload, body: &str, attempts: u32) -> Result<Self> {
        let malformed = |message: String| {
            Error::transport(TransportFailure::MalformedResponse, attempts, message)
        };

        let json: Value = serde_json::from_str(body)
            .map_err(|e| malformed(format!("confirmation is not JSON: {e}")))?;

        let record_id = ["recordId", "modelId", "id"]
            .iter()
            .find_map(|key| scalar(&json[*key]))
            .ok_or_else(|| malformed("confirmation carries no record id".to_string()))?;

        let study_id = echoed(&json["studyId"], payload.study_id(), "studyId").map_err(malformed)?;
        let organization_id = echoed(
            &json["organizationId"],
            payload.organization_id(),
            "organizationId",
        )
        .map_err(malformed)?;

        let name_echo = [&json["modelName"], &json["name"], &json["model"]["name"]]
            .into_iter()
            .find(|v| !v.is_null())
            .unwrap_or(&json["modelName"]);
        let model_name = echoed(name_echo, payload.model_name(), "model name").map_err(malformed)?;

        Ok(Self {
            record_id,
            idempotency_key: payload.idempotency_key(),
            study_id,
            organization_id,
            model_name,
            attempts,
            accepted_at: Utc::now(),
        })
    }

    /// Server-assigned record id.
    #[must_use]
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Idempotency key the submission was sent with.
    #[must_use]
    pub const fn idempotency_key(&self) -> IdempotencyKey {
        self.idempotency_key
    }

    /// Study the record was filed under.
    #[must_use]
    pub fn study_id(&self) -> &str {
        &self.study_id
    }

    /// Organization the record was filed under.
    #[must_use]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Name of the registered model.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Number of sends it took, including retries.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// When the confirmation was received.
    #[must_use]
    pub const fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }
}

/// Render a string or number as text; ids arrive as either.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn echoed(value: &Value, submitted: &str, what: &str) -> std::result::Result<String, String> {
    match scalar(value) {
        None => Ok(submitted.to_string()),
        Some(echo) if echo == submitted => Ok(echo),
        Some(echo) => Err(format!(
            "confirmation {what} `{echo}` does not match submitted `{submitted}`"
        )),
    }
}
