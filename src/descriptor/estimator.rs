//! Serialized Estimator - hyperparameters exported from a Python modeling library

use super::{Introspect, RawParam};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Estimator state exported as JSON by the modeling workflow.
///
/// This is the hand-off format for libraries that live outside the Rust
/// process (scikit-learn, xgboost, ...). The exporter dumps the estimator's
/// `get_params()` output:
///
/// ```json
/// {
///   "class": "sklearn.tree._classes.DecisionTreeClassifier",
///   "library": "scikit-learn",
///   "library_version": "1.3.0",
///   "params": {"criterion": "entropy", "random_state": 0}
/// }
/// ```
///
/// Parameter values the exporter cannot represent are written as
/// `{"__repr__": "<text>"}` and are coerced to that text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedEstimator {
    class: String,
    #[serde(default)]
    library: Option<String>,
    #[serde(default)]
    library_version: Option<String>,
    #[serde(default)]
    params: serde_json::Map<String, serde_json::Value>,
}

impl SerializedEstimator {
    /// Parse an estimator export.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedModelKind`] if the document is not a valid
    /// estimator export.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::UnsupportedModelKind {
            type_name: std::any::type_name::<Self>().to_string(),
            reason: format!("invalid estimator export: {e}"),
        })
    }

    /// Fully qualified class path.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Exported parameters, as written by the exporter.
    #[must_use]
    pub const fn params(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.params
    }
}

impl Introspect for SerializedEstimator {
    fn algorithm_name(&self) -> String {
        self.class
            .rsplit('.')
            .next()
            .unwrap_or(&self.class)
            .to_string()
    }

    fn source_library(&self) -> String {
        let library = self.library.clone().unwrap_or_else(|| {
            self.class
                .split('.')
                .next()
                .filter(|root| *root != self.class)
                .unwrap_or("unknown")
                .to_string()
        });

        match &self.library_version {
            Some(version) => format!("{library} {version}"),
            None => library,
        }
    }

    fn hyperparameters(&self) -> Option<Vec<(String, RawParam)>> {
        Some(
            self.params
                .iter()
                .map(|(name, value)| (name.clone(), to_raw(value)))
                .collect(),
        )
    }
}

fn to_raw(value: &serde_json::Value) -> RawParam {
    match value
        .as_object()
        .filter(|obj| obj.len() == 1)
        .and_then(|obj| obj.get("__repr__"))
        .and_then(serde_json::Value::as_str)
    {
        Some(repr) => RawParam::Opaque(repr.to_string()),
        None => RawParam::Nested(value.clone()),
    }
}
