//! Adapter registry for opaque model objects

use super::{describe, Introspect, ModelDescriptor, SerializedEstimator};
use crate::{Error, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;

type DescribeFn = fn(&dyn Any) -> Result<ModelDescriptor>;

struct Adapter {
    type_name: &'static str,
    describe: DescribeFn,
}

/// Registry mapping concrete model types to their [`Introspect`] adapter.
///
/// The model passed to [`Extractor::extract`] is treated as opaque: the
/// extractor looks its type up, borrows it read-only for the duration of the
/// call and keeps no reference afterwards. Unregistered types fail with
/// [`Error::UnsupportedModelKind`].
///
/// Registration takes `&self`, so a shared extractor can be extended while
/// submissions are in flight.
pub struct Extractor {
    adapters: DashMap<TypeId, Adapter>,
}

impl Extractor {
    /// Create an empty extractor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            adapters: DashMap::new(),
        }
    }

    /// Create an extractor with the built-in adapters registered:
    /// [`SerializedEstimator`] and `serde_json::Value`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let extractor = Self::new();
        extractor.register::<SerializedEstimator>();
        extractor.register::<serde_json::Value>();
        extractor
    }

    /// Register `T` as an introspectable model type.
    ///
    /// Re-registering a type is a no-op.
    pub fn register<T: Introspect + Any>(&self) {
        self.adapters
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Adapter {
                type_name: std::any::type_name::<T>(),
                describe: describe_any::<T>,
            });
    }

    /// Check whether `T` has an adapter.
    #[must_use]
    pub fn supports<T: Any>(&self) -> bool {
        self.adapters.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Check if no adapters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Extract a [`ModelDescriptor`] from an opaque model object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedModelKind`] if no adapter is registered for
    /// `M`, or if the adapter finds no hyperparameters on this instance.
    pub fn extract<M: Any>(&self, model: &M) -> Result<ModelDescriptor> {
        let describe = self
            .adapters
            .get(&TypeId::of::<M>())
            .map(|adapter| adapter.describe)
            .ok_or_else(|| Error::UnsupportedModelKind {
                type_name: std::any::type_name::<M>().to_string(),
                reason: "no introspection adapter registered for this type".to_string(),
            })?;

        describe(model)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.adapters.iter().map(|a| a.type_name).collect();
        names.sort_unstable();
        f.debug_struct("Extractor").field("adapters", &names).finish()
    }
}

fn describe_any<T: Introspect + Any>(model: &dyn Any) -> Result<ModelDescriptor> {
    model
        .downcast_ref::<T>()
        .ok_or_else(|| Error::UnsupportedModelKind {
            type_name: std::any::type_name::<T>().to_string(),
            reason: "model object does not match its registered adapter".to_string(),
        })
        .and_then(describe)
}

/// Plain JSON objects shaped like an estimator export:
/// `{"class": "...", "library": "...", "params": {...}}`.
impl Introspect for serde_json::Value {
    fn algorithm_name(&self) -> String {
        self.get("class")
            .and_then(serde_json::Value::as_str)
            .map(|class| class.rsplit('.').next().unwrap_or(class).to_string())
            .unwrap_or_default()
    }

    fn source_library(&self) -> String {
        self.get("library")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    }

    fn hyperparameters(&self) -> Option<Vec<(String, super::RawParam)>> {
        self.get("params")?.as_object().map(|params| {
            params
                .iter()
                .map(|(name, value)| (name.clone(), super::RawParam::Nested(value.clone())))
                .collect()
        })
    }
}
