//! # passport-capture: ML Experiment Provenance Submission
//!
//! **Version**: 0.1.0
//!
//! passport-capture describes a trained model, combines the description
//! with the experiment's learning stages and evaluation measures, and files
//! the result with a passport metadata registry for audit and
//! reproducibility.
//!
//! ## Pipeline
//!
//! ```text
//! trained model ──▶ Extractor ──▶ ModelDescriptor ─┐
//!                                                  ├─▶ Assembler ──▶ SubmissionPayload
//! ModelRecord + LearningStage[] + EvaluationMeasure[] ┘                     │
//!                                                                           ▼
//!                              SessionManager ──credential──▶ Transport ──▶ SubmissionReceipt
//! ```
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke**: malformed metadata is rejected before any network call
//! - **Jidoka**: every failure is classified (fix data / retry later / contact operator)
//! - **Heijunka**: one credential refresh regardless of how many submissions notice expiry
//! - **Muda elimination**: retries reuse one idempotency key, never duplicating records
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use passport_capture::config::ClientConfig;
//! use passport_capture::descriptor::SerializedEstimator;
//! use passport_capture::metadata::{LearningStage, LearningStageType, ModelRecord};
//! use passport_capture::PassportClient;
//!
//! # async fn run() -> passport_capture::Result<()> {
//! let client = PassportClient::new(ClientConfig::from_env()?)?;
//! let model = SerializedEstimator::from_json_str(
//!     r#"{"class": "sklearn.linear_model.Lasso", "params": {"alpha": 0.1}}"#,
//! )?;
//!
//! let receipt = client
//!     .submit_results(
//!         &model,
//!         &[LearningStage::new(LearningStageType::Training, 100.0)],
//!         &[],
//!         &ModelRecord::new("lasso-baseline"),
//!     )
//!     .await?;
//! println!("{} after {} attempt(s)", receipt.record_id(), receipt.attempts());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod metadata;
pub mod payload;
pub mod session;
pub mod transport;

pub use client::PassportClient;
pub use error::{Error, ErrorCategory, Result};
