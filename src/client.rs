//! Passport client - extraction, assembly and submission in one call
//!
//! ## Usage
//!
//! ```rust,no_run
//! use passport_capture::config::ClientConfig;
//! use passport_capture::descriptor::SerializedEstimator;
//! use passport_capture::metadata::{
//!     EvaluationMeasure, EvaluationMeasureType, LearningStage, LearningStageType, ModelRecord,
//! };
//! use passport_capture::PassportClient;
//!
//! # async fn run() -> passport_capture::Result<()> {
//! let config = ClientConfig::builder("http://localhost:80/ai4hf/passport/api", "1", "1")
//!     .password("data_scientist", "data_scientist")
//!     .build()?;
//! let client = PassportClient::new(config)?;
//!
//! let model = SerializedEstimator::from_json_str(
//!     r#"{"class": "sklearn.tree.DecisionTreeClassifier",
//!         "params": {"criterion": "entropy", "random_state": 0}}"#,
//! )?;
//!
//! let receipt = client
//!     .submit_results(
//!         &model,
//!         &[
//!             LearningStage::new(LearningStageType::Training, 80.0),
//!             LearningStage::new(LearningStageType::Test, 20.0),
//!         ],
//!         &[EvaluationMeasure::new(EvaluationMeasureType::Accuracy, "0.86")],
//!         &ModelRecord::new("heart-failure-dt"),
//!     )
//!     .await?;
//! println!("stored as {}", receipt.record_id());
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::descriptor::{Extractor, Introspect};
use crate::metadata::{EvaluationMeasure, LearningStage, ModelRecord};
use crate::payload::{Assembler, SubmissionPayload};
use crate::session::SessionManager;
use crate::transport::{HttpPassportApi, PassportApi, SubmissionReceipt, Transport};
use crate::Result;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Client for one study/organization on one passport server.
///
/// Cheap to share: all methods take `&self`, and concurrent submissions
/// share a single session.
#[derive(Debug)]
pub struct PassportClient<A = HttpPassportApi> {
    config: ClientConfig,
    extractor: Extractor,
    assembler: Assembler,
    transport: Transport<A>,
}

impl PassportClient<HttpPassportApi> {
    /// Create a client talking HTTP to the configured server.
    ///
    /// No network call is made until the first submission.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = HttpPassportApi::new(&config)?;
        Ok(Self::with_api(config, api))
    }
}

impl<A: PassportApi> PassportClient<A> {
    /// Create a client over a custom [`PassportApi`] implementation.
    #[must_use]
    pub fn with_api(config: ClientConfig, api: A) -> Self {
        let assembler = Assembler::new(config.target()).with_policy(config.stage_total_policy());
        let transport = Transport::new(Arc::new(api), config.auth().clone(), *config.retry());

        Self {
            config,
            extractor: Extractor::with_defaults(),
            assembler,
            transport,
        }
    }

    /// Teach the client to describe models of type `T`.
    pub fn register_model<T: Introspect + Any>(&self) {
        self.extractor.register::<T>();
    }

    /// Configuration the client was built from.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Model introspection registry.
    #[must_use]
    pub const fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Shared session.
    #[must_use]
    pub const fn session(&self) -> &SessionManager<A> {
        self.transport.session()
    }

    /// Describe `model` and assemble a payload without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedModelKind`] or
    /// [`crate::Error::Validation`]; nothing is sent.
    pub fn prepare<M: Any>(
        &self,
        model: &M,
        stages: &[LearningStage],
        measures: &[EvaluationMeasure],
        record: &ModelRecord,
    ) -> Result<SubmissionPayload> {
        let descriptor = self.extractor.extract(model)?;
        debug!(
            algorithm = descriptor.algorithm_name(),
            parameters = descriptor.hyperparameters().len(),
            "Model described"
        );
        self.assembler.assemble(&descriptor, record, stages, measures)
    }

    /// Describe `model`, assemble it with the supplied records, and submit.
    ///
    /// Extraction and validation failures are reported before any network
    /// call is made.
    ///
    /// # Arguments
    ///
    /// * `model` - Trained model of a registered type
    /// * `stages` - Learning stages, in order
    /// * `measures` - Evaluation measures, at most one per type
    /// * `record` - Caller-supplied model identity
    ///
    /// # Errors
    ///
    /// Any [`crate::Error`]; see [`PassportClient::prepare`] and
    /// [`Transport::submit`].
    pub async fn submit_results<M: Any>(
        &self,
        model: &M,
        stages: &[LearningStage],
        measures: &[EvaluationMeasure],
        record: &ModelRecord,
    ) -> Result<SubmissionReceipt> {
        let payload = self.prepare(model, stages, measures, record)?;
        self.submit_payload(&payload, None).await
    }

    /// Same as [`PassportClient::submit_results`], bounded by `deadline`.
    ///
    /// # Errors
    ///
    /// As [`PassportClient::submit_results`], plus a
    /// [`crate::Error::Transport`] timeout once `deadline` elapses.
    pub async fn submit_results_with_deadline<M: Any>(
        &self,
        model: &M,
        stages: &[LearningStage],
        measures: &[EvaluationMeasure],
        record: &ModelRecord,
        deadline: Duration,
    ) -> Result<SubmissionReceipt> {
        let payload = self.prepare(model, stages, measures, record)?;
        self.submit_payload(&payload, Some(deadline)).await
    }

    /// Submit an already assembled payload.
    ///
    /// Resubmitting the same payload reuses its idempotency key.
    ///
    /// # Errors
    ///
    /// See [`Transport::submit`].
    pub async fn submit_payload(
        &self,
        payload: &SubmissionPayload,
        deadline: Option<Duration>,
    ) -> Result<SubmissionReceipt> {
        self.transport.submit(payload, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{RawParam, SerializedEstimator};
    use crate::metadata::{EvaluationMeasureType, LearningStageType};
    use crate::transport::fake::ScriptedApi;
    use crate::transport::{ApiResponse, RetryPolicy};
    use crate::Error;

    struct KMeans {
        clusters: i64,
    }

    impl Introspect for KMeans {
        fn algorithm_name(&self) -> String {
            "KMeans".to_string()
        }

        fn source_library(&self) -> String {
            "linfa 0.7".to_string()
        }

        fn hyperparameters(&self) -> Option<Vec<(String, RawParam)>> {
            Some(vec![("n_clusters".to_string(), self.clusters.into())])
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::builder("http://localhost:80/ai4hf/passport/api", "1", "1")
            .password("data_scientist", "data_scientist")
            .retry(RetryPolicy::default().with_base_delay(Duration::from_millis(1)))
            .build()
            .unwrap()
    }

    fn stages() -> Vec<LearningStage> {
        vec![
            LearningStage::new(LearningStageType::Training, 80.0),
            LearningStage::new(LearningStageType::Test, 20.0),
        ]
    }

    fn tree() -> SerializedEstimator {
        SerializedEstimator::from_json_str(
            r#"{"class": "sklearn.tree.DecisionTreeClassifier", "library": "scikit-learn",
                "params": {"criterion": "entropy", "random_state": 0}}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_results() {
        let client = PassportClient::with_api(config(), ScriptedApi::new());
        let measures = [EvaluationMeasure::new(EvaluationMeasureType::Accuracy, "0.86")];

        let receipt = client
            .submit_results(&tree(), &stages(), &measures, &ModelRecord::new("dt"))
            .await
            .unwrap();

        assert_eq!(receipt.model_name(), "dt");
        assert_eq!(receipt.study_id(), "1");
        assert_eq!(client.session().authentication_count(), 1);
    }

    #[tokio::test]
    async fn test_unregistered_model_fails_before_network() {
        let client = PassportClient::with_api(config(), ScriptedApi::new());
        let err = client
            .submit_results(&KMeans { clusters: 3 }, &stages(), &[], &ModelRecord::new("km"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedModelKind { .. }));
        assert_eq!(client.session().authentication_count(), 0);
    }

    #[tokio::test]
    async fn test_registered_model() {
        let client = PassportClient::with_api(config(), ScriptedApi::new());
        client.register_model::<KMeans>();

        let payload = client
            .prepare(&KMeans { clusters: 3 }, &stages(), &[], &ModelRecord::new("km"))
            .unwrap();
        assert_eq!(payload.algorithm().name, "KMeans");
        assert_eq!(payload.implementation().software, "linfa 0.7");
    }

    #[tokio::test]
    async fn test_invalid_metadata_fails_before_network() {
        let client = PassportClient::with_api(config(), ScriptedApi::new());
        let err = client
            .submit_results(&tree(), &[], &[], &ModelRecord::new("dt"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(client.session().authentication_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_variant() {
        let api = ScriptedApi::new().with_submit_delay(Duration::from_millis(300));
        let client = PassportClient::with_api(config(), api);

        let err = client
            .submit_results_with_deadline(
                &tree(),
                &stages(),
                &[],
                &ModelRecord::new("dt"),
                Duration::from_millis(30),
            )
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_resubmitting_payload_keeps_key() {
        let api = ScriptedApi::new();
        api.push_submit(Ok(ApiResponse::new(502, "Bad Gateway")));
        api.push_submit(Ok(ApiResponse::new(502, "Bad Gateway")));
        api.push_submit(Ok(ApiResponse::new(502, "Bad Gateway")));
        let client = PassportClient::with_api(config(), api);

        let payload = client
            .prepare(&tree(), &stages(), &[], &ModelRecord::new("dt"))
            .unwrap();
        assert!(client.submit_payload(&payload, None).await.is_err());

        let receipt = client.submit_payload(&payload, None).await.unwrap();
        assert_eq!(receipt.idempotency_key(), payload.idempotency_key());
    }
}
