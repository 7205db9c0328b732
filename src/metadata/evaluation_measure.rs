//! Evaluation Measure - a named metric and its recorded value

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a measure's value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureScale {
    /// Value must parse as a finite real number.
    Numeric,
    /// Value is free text (e.g. a serialized matrix).
    Textual,
}

/// Closed set of evaluation measure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationMeasureType {
    /// Fraction of correct predictions.
    Accuracy,
    /// Harmonic mean of precision and recall.
    #[serde(rename = "F1_SCORE")]
    F1Score,
    /// Positive predictive value.
    Precision,
    /// Sensitivity / true positive rate.
    Recall,
    /// True negative rate.
    Specificity,
    /// Area under the ROC curve.
    AucRoc,
    /// Mean squared error.
    MeanSquaredError,
    /// Mean absolute error.
    MeanAbsoluteError,
    /// Coefficient of determination.
    #[serde(rename = "R2_SCORE")]
    R2Score,
    /// Cross-entropy loss.
    LogLoss,
    /// Confusion matrix, serialized as text.
    ConfusionMatrix,
}

impl EvaluationMeasureType {
    /// Wire name of the measure type (e.g. `"F1_SCORE"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accuracy => "ACCURACY",
            Self::F1Score => "F1_SCORE",
            Self::Precision => "PRECISION",
            Self::Recall => "RECALL",
            Self::Specificity => "SPECIFICITY",
            Self::AucRoc => "AUC_ROC",
            Self::MeanSquaredError => "MEAN_SQUARED_ERROR",
            Self::MeanAbsoluteError => "MEAN_ABSOLUTE_ERROR",
            Self::R2Score => "R2_SCORE",
            Self::LogLoss => "LOG_LOSS",
            Self::ConfusionMatrix => "CONFUSION_MATRIX",
        }
    }

    /// Expected value encoding for this measure type.
    #[must_use]
    pub const fn scale(self) -> MeasureScale {
        match self {
            Self::ConfusionMatrix => MeasureScale::Textual,
            _ => MeasureScale::Numeric,
        }
    }

    /// Data type label sent alongside the value.
    #[must_use]
    pub const fn data_type(self) -> &'static str {
        match self.scale() {
            MeasureScale::Numeric => "float",
            MeasureScale::Textual => "string",
        }
    }
}

impl fmt::Display for EvaluationMeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation Measure records one metric for the trained model.
///
/// The value is kept as the caller's string so that `"0.94"` is transmitted
/// as `"0.94"`, never re-rendered through a float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMeasure {
    measure_type: EvaluationMeasureType,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl EvaluationMeasure {
    /// Create a new evaluation measure.
    #[must_use]
    pub fn new(measure_type: EvaluationMeasureType, value: impl Into<String>) -> Self {
        Self {
            measure_type,
            value: value.into(),
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Get the measure type.
    #[must_use]
    pub const fn measure_type(&self) -> EvaluationMeasureType {
        self.measure_type
    }

    /// Get the raw value string.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
