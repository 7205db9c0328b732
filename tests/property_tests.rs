//! Property-based tests for passport-capture
//!
//! - Percentages in [0, 100] summing to at most 100 always assemble
//! - Anything outside [0, 100] is always rejected
//! - Values, order and identifiers survive assembly unchanged
//! - Run with ProptestConfig::with_cases(100)

use passport_capture::descriptor::{describe, ModelDescriptor, ParamValue, SerializedEstimator};
use passport_capture::metadata::{
    EvaluationMeasure, EvaluationMeasureType, LearningStage, LearningStageType, ModelRecord,
};
use passport_capture::payload::{Assembler, SubmissionTarget};
use passport_capture::Error;
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn arb_stage_type() -> impl Strategy<Value = LearningStageType> {
    prop_oneof![
        Just(LearningStageType::Training),
        Just(LearningStageType::Validation),
        Just(LearningStageType::Test),
        Just(LearningStageType::ExternalValidation),
    ]
}

/// Stages whose percentages sum to at most 100
fn arb_valid_stages() -> impl Strategy<Value = Vec<LearningStage>> {
    proptest::collection::vec((arb_stage_type(), 0.0f64..=1.0), 1..6).prop_map(|parts| {
        let n = parts.len() as f64;
        parts
            .into_iter()
            .map(|(ty, share)| LearningStage::new(ty, share * 100.0 / n))
            .collect()
    })
}

fn arb_numeric_measures() -> impl Strategy<Value = Vec<EvaluationMeasure>> {
    let types = vec![
        EvaluationMeasureType::Accuracy,
        EvaluationMeasureType::Precision,
        EvaluationMeasureType::Recall,
        EvaluationMeasureType::F1Score,
        EvaluationMeasureType::AucRoc,
        EvaluationMeasureType::LogLoss,
    ];
    (
        proptest::sample::subsequence(types, 0..=6),
        proptest::collection::vec(-1.0e6f64..1.0e6, 6),
    )
        .prop_map(|(types, values)| {
            types
                .into_iter()
                .zip(values)
                .map(|(ty, v)| EvaluationMeasure::new(ty, v.to_string()))
                .collect()
        })
}

fn assembler() -> Assembler {
    Assembler::new(SubmissionTarget::new("study-7", "org-3"))
}

fn descriptor() -> ModelDescriptor {
    ModelDescriptor::new("RandomForestClassifier", BTreeMap::new(), "scikit-learn")
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: valid stages and numeric measures always assemble
    #[test]
    fn prop_valid_inputs_assemble(
        stages in arb_valid_stages(),
        measures in arb_numeric_measures(),
    ) {
        let payload = assembler()
            .assemble(&descriptor(), &ModelRecord::new("rf"), &stages, &measures);
        prop_assert!(payload.is_ok(), "{:?}", payload.err());
    }

    /// Property: stage order, types and percentages are preserved exactly
    #[test]
    fn prop_stages_preserved(stages in arb_valid_stages()) {
        let payload = assembler()
            .assemble(&descriptor(), &ModelRecord::new("rf"), &stages, &[])
            .unwrap();

        prop_assert_eq!(payload.learning_stages().len(), stages.len());
        for (entry, stage) in payload.learning_stages().iter().zip(&stages) {
            prop_assert_eq!(entry.learning_stage_name, stage.stage_type());
            prop_assert_eq!(entry.dataset_percentage.to_bits(), stage.dataset_percentage().to_bits());
        }
    }

    /// Property: measure values are sent verbatim
    #[test]
    fn prop_measure_values_verbatim(measures in arb_numeric_measures()) {
        let stages = [LearningStage::new(LearningStageType::Training, 100.0)];
        let payload = assembler()
            .assemble(&descriptor(), &ModelRecord::new("rf"), &stages, &measures)
            .unwrap();

        for (entry, measure) in payload.evaluation_measures().iter().zip(&measures) {
            prop_assert_eq!(entry.name, measure.measure_type());
            prop_assert_eq!(&entry.value, measure.value());
        }
    }

    /// Property: a percentage outside [0, 100] is always rejected
    #[test]
    fn prop_out_of_range_rejected(
        pct in prop_oneof![-1.0e9f64..-1.0e-9, 100.000_001f64..1.0e9],
        position in 0usize..3,
    ) {
        let mut stages = vec![
            LearningStage::new(LearningStageType::Training, 0.0),
            LearningStage::new(LearningStageType::Validation, 0.0),
            LearningStage::new(LearningStageType::Test, 0.0),
        ];
        stages[position] = LearningStage::new(LearningStageType::Test, pct);

        let err = assembler()
            .assemble(&descriptor(), &ModelRecord::new("rf"), &stages, &[])
            .unwrap_err();
        let expected = format!("learning_stages[{position}].dataset_percentage");
        prop_assert!(matches!(err, Error::Validation { ref field, .. } if *field == expected), "expected validation error on {}", expected);
    }

    /// Property: identifiers and model name survive serialization
    #[test]
    fn prop_identity_round_trip(
        study in "[a-zA-Z0-9-]{1,24}",
        org in "[a-zA-Z0-9-]{1,24}",
        name in "[a-zA-Z0-9 _.-]{0,40}[a-z]",
    ) {
        let payload = Assembler::new(SubmissionTarget::new(study.clone(), org.clone()))
            .assemble(
                &descriptor(),
                &ModelRecord::new(name.clone()),
                &[LearningStage::new(LearningStageType::Training, 100.0)],
                &[],
            )
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        prop_assert_eq!(json["studyId"].as_str(), Some(study.as_str()));
        prop_assert_eq!(json["organizationId"].as_str(), Some(org.as_str()));
        prop_assert_eq!(json["model"]["name"].as_str(), Some(name.as_str()));
    }

    /// Property: integer hyperparameters keep their exact value
    #[test]
    fn prop_integer_params_exact(value in any::<i64>()) {
        let export = serde_json::json!({
            "class": "sklearn.ensemble.RandomForestClassifier",
            "params": {"random_state": value},
        });
        let estimator = SerializedEstimator::from_json_str(&export.to_string()).unwrap();
        let descriptor = describe(&estimator).unwrap();

        prop_assert_eq!(
            descriptor.hyperparameters().get("random_state"),
            Some(&ParamValue::Int(value))
        );
    }
}
