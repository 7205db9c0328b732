//! Model Descriptor Extraction
//!
//! Turns an opaque trained-model object into a serializable
//! [`ModelDescriptor`]: algorithm family, hyperparameter map and the library
//! that produced it.
//!
//! ## Architecture
//!
//! ```text
//! &M (opaque, borrowed)
//!    ↓  Extractor::extract       TypeId lookup in adapter registry
//! Introspect adapter
//!    ↓  describe()               RawParam → ParamValue coercion
//! ModelDescriptor
//! ```
//!
//! Extraction is polymorphic over the [`Introspect`] capability rather than
//! over a fixed list of algorithms. Adapters for a modeling ecosystem
//! implement `Introspect`; the core never names their types.
//!
//! ## Usage
//!
//! ```rust
//! use passport_capture::descriptor::{Extractor, ParamValue, SerializedEstimator};
//!
//! let estimator = SerializedEstimator::from_json_str(r#"{
//!     "class": "sklearn.tree.DecisionTreeClassifier",
//!     "library": "scikit-learn",
//!     "params": {"criterion": "entropy", "random_state": 0}
//! }"#)?;
//!
//! let descriptor = Extractor::with_defaults().extract(&estimator)?;
//! assert_eq!(descriptor.algorithm_name(), "DecisionTreeClassifier");
//! assert_eq!(
//!     descriptor.hyperparameters().get("criterion"),
//!     Some(&ParamValue::Text("entropy".into()))
//! );
//! # Ok::<(), passport_capture::Error>(())
//! ```

mod estimator;
mod extractor;
mod introspect;

pub use estimator::SerializedEstimator;
pub use extractor::Extractor;
pub use introspect::{describe, Introspect, RawParam};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A JSON-safe hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Explicit `None` / `null`
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Finite float
    Float(f64),
    /// Text, including coerced string representations
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Canonical description of a trained model.
///
/// Created only by extraction at submission time; never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    algorithm_name: String,
    hyperparameters: BTreeMap<String, ParamValue>,
    source_library: String,
    #[serde(skip)]
    coerced: Vec<String>,
}

impl ModelDescriptor {
    /// Create a descriptor from already-canonical parts.
    #[must_use]
    pub fn new(
        algorithm_name: impl Into<String>,
        hyperparameters: BTreeMap<String, ParamValue>,
        source_library: impl Into<String>,
    ) -> Self {
        Self {
            algorithm_name: algorithm_name.into(),
            hyperparameters,
            source_library: source_library.into(),
            coerced: Vec::new(),
        }
    }

    /// Get the algorithm name (e.g. `DecisionTreeClassifier`).
    #[must_use]
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    /// Get the hyperparameter map, ordered by name.
    #[must_use]
    pub const fn hyperparameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.hyperparameters
    }

    /// Get the library that produced the model (e.g. `scikit-learn 1.3.0`).
    #[must_use]
    pub fn source_library(&self) -> &str {
        &self.source_library
    }

    /// Names of hyperparameters whose values were coerced to strings.
    #[must_use]
    pub fn coerced_parameters(&self) -> &[String] {
        &self.coerced
    }
}
