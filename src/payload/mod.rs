//! Submission Payload Assembly
//!
//! Combines the extracted [`ModelDescriptor`](crate::descriptor::ModelDescriptor)
//! with the caller's records into the one document sent to the passport
//! server. Assembly is a pure transformation: no I/O, no clock other than
//! the `submittedAt` stamp, no retries.
//!
//! ## Wire Format
//!
//! ```text
//! {
//!   "idempotencyKey": "6f1c...",            one per logical submission
//!   "studyId": "1", "organizationId": "1",
//!   "submittedAt": "2026-10-18T09:00:00Z",
//!   "model": {"name": "test", ...},
//!   "algorithm": {"name": "DecisionTreeClassifier", "parameters": {...}},
//!   "implementation": {"software": "scikit-learn 1.3.0"},
//!   "learningStages": [{"learningStageName": "TRAINING", "datasetPercentage": 70.0}],
//!   "evaluationMeasures": [{"name": "ACCURACY", "value": "0.94", "dataType": "float"}]
//! }
//! ```

mod assemble;

pub use assemble::{Assembler, StageTotalPolicy};

use crate::descriptor::ParamValue;
use crate::metadata::{EvaluationMeasureType, LearningStageType, ModelRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Token attached to a logical submission so that retried deliveries do
/// not create duplicate server records.
///
/// The passport server is assumed to deduplicate on this key; the client
/// relies on that external behavior to make 5xx retries safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a caller-chosen UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for IdempotencyKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| Error::validation("idempotency_key", e.to_string()))
    }
}

/// Study and organization a submission is filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTarget {
    study_id: String,
    organization_id: String,
}

impl SubmissionTarget {
    /// Create a target.
    #[must_use]
    pub fn new(study_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            study_id: study_id.into(),
            organization_id: organization_id.into(),
        }
    }

    /// Study identifier.
    #[must_use]
    pub fn study_id(&self) -> &str {
        &self.study_id
    }

    /// Organization identifier.
    #[must_use]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }
}

/// Algorithm block: the descriptor's family name and hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmEntry {
    /// Algorithm family name
    pub name: String,
    /// Hyperparameters, ordered by name
    pub parameters: BTreeMap<String, ParamValue>,
}

/// Implementation block: the library that produced the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationEntry {
    /// Library name and version
    pub software: String,
}

/// One learning stage as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEntry {
    /// Stage type
    pub learning_stage_name: LearningStageType,
    /// Dataset share, exactly as supplied
    pub dataset_percentage: f64,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One evaluation measure as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureEntry {
    /// Measure type
    pub name: EvaluationMeasureType,
    /// Value, verbatim
    pub value: String,
    /// `"float"` or `"string"`
    pub data_type: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The fully assembled document for one submission call.
///
/// Built fresh for every call and dropped after transmission; retries of
/// the same call resend this exact payload, including its idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    idempotency_key: IdempotencyKey,
    study_id: String,
    organization_id: String,
    submitted_at: DateTime<Utc>,
    model: ModelRecord,
    algorithm: AlgorithmEntry,
    implementation: ImplementationEntry,
    learning_stages: Vec<StageEntry>,
    evaluation_measures: Vec<MeasureEntry>,
}

impl SubmissionPayload {
    /// Idempotency key of this submission.
    #[must_use]
    pub const fn idempotency_key(&self) -> IdempotencyKey {
        self.idempotency_key
    }

    /// Study identifier.
    #[must_use]
    pub fn study_id(&self) -> &str {
        &self.study_id
    }

    /// Organization identifier.
    #[must_use]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// When the payload was assembled.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// The caller's model record.
    #[must_use]
    pub const fn model(&self) -> &ModelRecord {
        &self.model
    }

    /// Name of the submitted model.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Algorithm block.
    #[must_use]
    pub const fn algorithm(&self) -> &AlgorithmEntry {
        &self.algorithm
    }

    /// Implementation block.
    #[must_use]
    pub const fn implementation(&self) -> &ImplementationEntry {
        &self.implementation
    }

    /// Learning stages, in caller order.
    #[must_use]
    pub fn learning_stages(&self) -> &[StageEntry] {
        &self.learning_stages
    }

    /// Evaluation measures, in caller order.
    #[must_use]
    pub fn evaluation_measures(&self) -> &[MeasureEntry] {
        &self.evaluation_measures
    }

    /// Serialize to the JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::validation("payload", e.to_string()))
    }
}
