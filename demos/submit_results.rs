//! Submit Results Example
//!
//! Files a decision-tree experiment with a passport server: the estimator
//! export written by the training script, a 75/25 train/test split, and
//! two evaluation measures.
//!
//! Configuration comes from `PASSPORT_*` environment variables, falling
//! back to a local development server:
//!
//! ```text
//! PASSPORT_SERVER_URL=http://localhost:80/ai4hf/passport/api \
//! PASSPORT_STUDY_ID=1 PASSPORT_ORGANIZATION_ID=1 \
//! PASSPORT_USERNAME=data_scientist PASSPORT_PASSWORD=data_scientist \
//! RUST_LOG=passport_capture=debug \
//!     cargo run --example submit_results
//! ```

use anyhow::Context;
use passport_capture::config::ClientConfig;
use passport_capture::descriptor::SerializedEstimator;
use passport_capture::metadata::{
    EvaluationMeasure, EvaluationMeasureType, LearningStage, LearningStageType, ModelRecord,
};
use passport_capture::{ErrorCategory, PassportClient};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// What the training script exports after `classifier.fit(...)`
const ESTIMATOR_EXPORT: &str = r#"{
    "class": "sklearn.tree._classes.DecisionTreeClassifier",
    "library": "scikit-learn",
    "library_version": "1.3.0",
    "params": {
        "ccp_alpha": 0.0,
        "class_weight": null,
        "criterion": "entropy",
        "max_depth": null,
        "max_features": null,
        "min_samples_leaf": 1,
        "min_samples_split": 2,
        "random_state": 0,
        "splitter": "best"
    }
}"#;

fn config() -> anyhow::Result<ClientConfig> {
    if std::env::var_os("PASSPORT_SERVER_URL").is_some() {
        return ClientConfig::from_env().context("invalid PASSPORT_* configuration");
    }
    ClientConfig::builder("http://localhost:80/ai4hf/passport/api", "1", "1")
        .password("data_scientist", "data_scientist")
        .build()
        .context("invalid default configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Passport Submission ===\n");

    // -------------------------------------------------------------------------
    // 1. Client
    // -------------------------------------------------------------------------
    let config = config()?;
    println!("1. Server: {}", config.server_url());
    println!("   Study: {}  Organization: {}", config.study_id(), config.organization_id());
    let client = PassportClient::new(config)?;

    // -------------------------------------------------------------------------
    // 2. Experiment metadata
    // -------------------------------------------------------------------------
    let model = SerializedEstimator::from_json_str(ESTIMATOR_EXPORT)?;
    let learning_stages = [
        LearningStage::new(LearningStageType::Training, 75.0),
        LearningStage::new(LearningStageType::Test, 25.0),
    ];
    let evaluation_measures = [
        EvaluationMeasure::new(EvaluationMeasureType::Accuracy, "0.94"),
        EvaluationMeasure::new(EvaluationMeasureType::F1Score, "0.88"),
    ];
    let model_info = ModelRecord::builder("test")
        .version("0.0.1")
        .model_type("classifier")
        .build();

    let payload = client.prepare(&model, &learning_stages, &evaluation_measures, &model_info)?;
    println!("\n2. Payload ({}):", payload.idempotency_key());
    println!("{}", serde_json::to_string_pretty(&payload)?);

    // -------------------------------------------------------------------------
    // 3. Submit
    // -------------------------------------------------------------------------
    println!("\n3. Submitting...");
    match client.submit_payload(&payload, Some(Duration::from_secs(60))).await {
        Ok(receipt) => {
            println!("   Record: {}", receipt.record_id());
            println!("   Attempts: {}", receipt.attempts());
            println!("   Accepted: {}", receipt.accepted_at());
            Ok(())
        }
        Err(e) => {
            let advice = match e.category() {
                ErrorCategory::FixData => "fix the submitted metadata",
                ErrorCategory::RetryLater => "retry later; the same payload is safe to resend",
                ErrorCategory::ContactOperator => "check credentials or contact the server operator",
            };
            println!("   Failed: {e}");
            println!("   Next step: {advice}");
            Err(e.into())
        }
    }
}
