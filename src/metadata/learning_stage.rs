//! Learning Stage - a phase of the workflow and its dataset share

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of learning stage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LearningStageType {
    /// Model fitting.
    Training,
    /// Hyperparameter selection / early stopping.
    Validation,
    /// Held-out evaluation.
    Test,
    /// Evaluation on data from a different site or cohort.
    ExternalValidation,
}

impl LearningStageType {
    /// Wire name of the stage type (e.g. `"TRAINING"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Training => "TRAINING",
            Self::Validation => "VALIDATION",
            Self::Test => "TEST",
            Self::ExternalValidation => "EXTERNAL_VALIDATION",
        }
    }
}

impl fmt::Display for LearningStageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Learning Stage pairs a stage type with the percentage of the dataset it used.
///
/// The percentage is stored exactly as supplied. Range checks happen in
/// [`crate::payload::Assembler`], never here, and values are never normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStage {
    learning_stage_type: LearningStageType,
    dataset_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl LearningStage {
    /// Create a new learning stage.
    ///
    /// # Arguments
    ///
    /// * `stage_type` - Which phase of the workflow
    /// * `dataset_percentage` - Share of the dataset, expected in `[0, 100]`
    #[must_use]
    pub const fn new(stage_type: LearningStageType, dataset_percentage: f64) -> Self {
        Self {
            learning_stage_type: stage_type,
            dataset_percentage,
            description: None,
        }
    }

    /// Attach a description (e.g. how the split was drawn).
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Get the stage type.
    #[must_use]
    pub const fn stage_type(&self) -> LearningStageType {
        self.learning_stage_type
    }

    /// Get the dataset percentage.
    #[must_use]
    pub const fn dataset_percentage(&self) -> f64 {
        self.dataset_percentage
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
