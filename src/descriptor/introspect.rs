//! The `Introspect` capability and value coercion

use super::{ModelDescriptor, ParamValue};
use crate::{Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A hyperparameter value as exposed by a modeling library, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawParam {
    /// Explicit `None`
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float, possibly non-finite
    Float(f64),
    /// Text
    Text(String),
    /// Structured value (list, mapping, nested estimator config)
    Nested(serde_json::Value),
    /// Value with no data representation (function reference, object handle);
    /// carries its display form
    Opaque(String),
}

impl From<bool> for RawParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for RawParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RawParam {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for RawParam {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for RawParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for RawParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<serde_json::Value> for RawParam {
    fn from(value: serde_json::Value) -> Self {
        Self::Nested(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for RawParam {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Capability: "exposes a gettable set of named hyperparameters".
///
/// Implement this for a model type (or an adapter wrapping one) to make it
/// describable. Extraction only borrows the model for the duration of the call.
///
/// # Example
///
/// ```rust
/// use passport_capture::descriptor::{describe, Introspect, RawParam};
///
/// struct Knn { k: u32 }
///
/// impl Introspect for Knn {
///     fn algorithm_name(&self) -> String { "KNeighborsClassifier".into() }
///     fn source_library(&self) -> String { "in-house".into() }
///     fn hyperparameters(&self) -> Option<Vec<(String, RawParam)>> {
///         Some(vec![("n_neighbors".into(), self.k.into())])
///     }
/// }
///
/// let descriptor = describe(&Knn { k: 5 })?;
/// assert_eq!(descriptor.hyperparameters().len(), 1);
/// # Ok::<(), passport_capture::Error>(())
/// ```
pub trait Introspect {
    /// Algorithm family name.
    fn algorithm_name(&self) -> String;

    /// Library (and version) that produced the model.
    fn source_library(&self) -> String;

    /// Named hyperparameters, or `None` if this instance exposes none.
    fn hyperparameters(&self) -> Option<Vec<(String, RawParam)>>;
}

/// Build a [`ModelDescriptor`] from anything implementing [`Introspect`].
///
/// Values that are not natively serializable are coerced to their string
/// form instead of failing the extraction.
///
/// # Errors
///
/// Returns [`Error::UnsupportedModelKind`] if the model exposes no
/// hyperparameters or no algorithm name.
pub fn describe<M: Introspect + ?Sized>(model: &M) -> Result<ModelDescriptor> {
    let type_name = std::any::type_name::<M>();

    let algorithm_name = model.algorithm_name();
    if algorithm_name.trim().is_empty() {
        return Err(Error::UnsupportedModelKind {
            type_name: type_name.to_string(),
            reason: "model reports an empty algorithm name".to_string(),
        });
    }

    let params = model
        .hyperparameters()
        .ok_or_else(|| Error::UnsupportedModelKind {
            type_name: type_name.to_string(),
            reason: "model exposes no hyperparameters".to_string(),
        })?;

    let mut hyperparameters = BTreeMap::new();
    let mut coerced = Vec::new();

    for (name, raw) in params {
        if name.is_empty() {
            warn!(algorithm = %algorithm_name, "skipping hyperparameter with empty name");
            continue;
        }
        let (value, was_coerced) = coerce(raw);
        if was_coerced {
            warn!(algorithm = %algorithm_name, param = %name, "hyperparameter coerced to string");
            coerced.push(name.clone());
        }
        hyperparameters.insert(name, value);
    }

    debug!(
        algorithm = %algorithm_name,
        params = hyperparameters.len(),
        "extracted model descriptor"
    );

    let mut descriptor =
        ModelDescriptor::new(algorithm_name, hyperparameters, model.source_library());
    descriptor.coerced = coerced;
    Ok(descriptor)
}

/// Map a raw value to a JSON-safe scalar. The flag is set when the value
/// had to be replaced by its string representation.
fn coerce(raw: RawParam) -> (ParamValue, bool) {
    match raw {
        RawParam::Null => (ParamValue::Null, false),
        RawParam::Bool(b) => (ParamValue::Bool(b), false),
        RawParam::Int(i) => (ParamValue::Int(i), false),
        RawParam::Float(x) => coerce_float(x),
        RawParam::Text(s) => (ParamValue::Text(s), false),
        RawParam::Opaque(repr) => (ParamValue::Text(repr), true),
        RawParam::Nested(value) => coerce_json(value),
    }
}

fn coerce_float(x: f64) -> (ParamValue, bool) {
    if x.is_finite() {
        (ParamValue::Float(x), false)
    } else {
        (ParamValue::Text(x.to_string()), true)
    }
}

fn coerce_json(value: serde_json::Value) -> (ParamValue, bool) {
    use serde_json::Value;

    match value {
        Value::Null => (ParamValue::Null, false),
        Value::Bool(b) => (ParamValue::Bool(b), false),
        Value::String(s) => (ParamValue::Text(s), false),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                (ParamValue::Int(i), false)
            } else if n.is_u64() {
                // Above i64::MAX: keep the digits exactly
                (ParamValue::Text(n.to_string()), true)
            } else {
                coerce_float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        other => (ParamValue::Text(other.to_string()), true),
    }
}
