//! Payload validation and assembly

use super::{
    AlgorithmEntry, IdempotencyKey, ImplementationEntry, MeasureEntry, StageEntry,
    SubmissionPayload, SubmissionTarget,
};
use crate::descriptor::ModelDescriptor;
use crate::metadata::{EvaluationMeasure, LearningStage, MeasureScale, ModelRecord};
use crate::{Error, Result};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Float slack when comparing the stage total against 100.
const TOTAL_EPSILON: f64 = 1e-9;

/// What to do when the stage percentages of one submission add up to more than 100.
///
/// Values are never rescaled either way. Totals below 100 are always accepted
/// (subsampled datasets are legitimate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum StageTotalPolicy {
    /// Fail with [`Error::Validation`].
    #[default]
    #[serde(rename = "reject_over_100")]
    RejectOver100,
    /// Log a warning and submit as-is.
    #[serde(rename = "warn_over_100")]
    WarnOver100,
}

/// Validates caller records and merges them with a model descriptor.
///
/// Poka-Yoke: every check that can be made locally is made here, before a
/// credential is requested or a byte is sent.
#[derive(Debug, Clone)]
pub struct Assembler {
    target: SubmissionTarget,
    policy: StageTotalPolicy,
}

impl Assembler {
    /// Create an assembler bound to a study/organization.
    #[must_use]
    pub fn new(target: SubmissionTarget) -> Self {
        Self {
            target,
            policy: StageTotalPolicy::default(),
        }
    }

    /// Set the stage total policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: StageTotalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The bound study/organization.
    #[must_use]
    pub const fn target(&self) -> &SubmissionTarget {
        &self.target
    }

    /// Assemble a payload with a freshly generated idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if:
    /// - the study or organization identifier is empty
    /// - the model name is empty
    /// - `stages` is empty
    /// - a stage percentage is outside `[0, 100]` (or not a number)
    /// - the stage total exceeds 100 under [`StageTotalPolicy::RejectOver100`]
    /// - a numeric measure's value does not parse as a finite real number
    /// - a measure type appears more than once
    pub fn assemble(
        &self,
        descriptor: &ModelDescriptor,
        record: &ModelRecord,
        stages: &[LearningStage],
        measures: &[EvaluationMeasure],
    ) -> Result<SubmissionPayload> {
        self.assemble_with_key(IdempotencyKey::generate(), descriptor, record, stages, measures)
    }

    /// Assemble a payload carrying a caller-supplied idempotency key.
    ///
    /// # Errors
    ///
    /// Same as [`Assembler::assemble`].
    pub fn assemble_with_key(
        &self,
        key: IdempotencyKey,
        descriptor: &ModelDescriptor,
        record: &ModelRecord,
        stages: &[LearningStage],
        measures: &[EvaluationMeasure],
    ) -> Result<SubmissionPayload> {
        self.check_target()?;
        check_record(record)?;
        self.check_stages(stages)?;
        check_measures(measures)?;

        Ok(SubmissionPayload {
            idempotency_key: key,
            study_id: self.target.study_id.clone(),
            organization_id: self.target.organization_id.clone(),
            submitted_at: Utc::now(),
            model: record.clone(),
            algorithm: AlgorithmEntry {
                name: descriptor.algorithm_name().to_string(),
                parameters: descriptor.hyperparameters().clone(),
            },
            implementation: ImplementationEntry {
                software: descriptor.source_library().to_string(),
            },
            learning_stages: stages
                .iter()
                .map(|stage| StageEntry {
                    learning_stage_name: stage.stage_type(),
                    dataset_percentage: stage.dataset_percentage(),
                    description: stage.description().map(str::to_string),
                })
                .collect(),
            evaluation_measures: measures
                .iter()
                .map(|measure| MeasureEntry {
                    name: measure.measure_type(),
                    value: measure.value().to_string(),
                    data_type: measure.measure_type().data_type().to_string(),
                    description: measure.description().map(str::to_string),
                })
                .collect(),
        })
    }

    fn check_target(&self) -> Result<()> {
        if self.target.study_id.trim().is_empty() {
            return Err(Error::validation("study_id", "no study bound to the client"));
        }
        if self.target.organization_id.trim().is_empty() {
            return Err(Error::validation(
                "organization_id",
                "no organization bound to the client",
            ));
        }
        Ok(())
    }

    fn check_stages(&self, stages: &[LearningStage]) -> Result<()> {
        if stages.is_empty() {
            return Err(Error::validation(
                "learning_stages",
                "at least one learning stage is required",
            ));
        }

        let mut total = 0.0;
        for (i, stage) in stages.iter().enumerate() {
            let pct = stage.dataset_percentage();
            if !(0.0..=100.0).contains(&pct) {
                return Err(Error::validation(
                    format!("learning_stages[{i}].dataset_percentage"),
                    format!("{pct} is outside [0, 100]"),
                ));
            }
            total += pct;
        }

        if total > 100.0 + TOTAL_EPSILON {
            match self.policy {
                StageTotalPolicy::RejectOver100 => {
                    return Err(Error::validation(
                        "learning_stages",
                        format!("dataset percentages sum to {total}, more than 100"),
                    ));
                }
                StageTotalPolicy::WarnOver100 => {
                    warn!(total, "learning stage percentages sum to more than 100");
                }
            }
        } else if total < 100.0 - TOTAL_EPSILON {
            debug!(total, "learning stage percentages sum to less than 100");
        }

        Ok(())
    }
}

fn check_record(record: &ModelRecord) -> Result<()> {
    if record.name().trim().is_empty() {
        return Err(Error::validation("model.name", "must not be empty"));
    }
    Ok(())
}

fn check_measures(measures: &[EvaluationMeasure]) -> Result<()> {
    let mut seen = HashSet::with_capacity(measures.len());

    for (i, measure) in measures.iter().enumerate() {
        let ty = measure.measure_type();
        if !seen.insert(ty) {
            return Err(Error::validation(
                format!("evaluation_measures[{i}]"),
                format!("{ty} is reported more than once"),
            ));
        }

        let value = measure.value();
        let valid = match ty.scale() {
            MeasureScale::Numeric => value.parse::<f64>().is_ok_and(f64::is_finite),
            MeasureScale::Textual => !value.trim().is_empty(),
        };
        if !valid {
            return Err(Error::validation(
                format!("evaluation_measures[{i}].value"),
                format!("`{value}` is not a valid {} value for {ty}", ty.data_type()),
            ));
        }
    }

    Ok(())
}
