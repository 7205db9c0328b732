//! Caller-supplied provenance records
//!
//! These are the records a modeling workflow hands to the client alongside
//! the trained model itself.
//!
//! ## Schema Overview
//!
//! ```text
//! ModelRecord (1)
//!     ├──< LearningStage (N) [ordered: TRAINING, TEST, ...]
//!     └──< EvaluationMeasure (N) [set: ACCURACY, F1_SCORE, ...]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use passport_capture::metadata::{
//!     EvaluationMeasure, EvaluationMeasureType, LearningStage, LearningStageType, ModelRecord,
//! };
//!
//! let model = ModelRecord::builder("heart-failure-dt").version("1.0.0").build();
//!
//! let stages = vec![
//!     LearningStage::new(LearningStageType::Training, 70.0),
//!     LearningStage::new(LearningStageType::Test, 30.0),
//! ];
//!
//! let measures = vec![
//!     EvaluationMeasure::new(EvaluationMeasureType::Accuracy, "0.94"),
//!     EvaluationMeasure::new(EvaluationMeasureType::F1Score, "0.88"),
//! ];
//! # let _ = (model, stages, measures);
//! ```

mod evaluation_measure;
mod learning_stage;
mod model_record;

pub use evaluation_measure::{EvaluationMeasure, EvaluationMeasureType, MeasureScale};
pub use learning_stage::{LearningStage, LearningStageType};
pub use model_record::{ModelRecord, ModelRecordBuilder};
