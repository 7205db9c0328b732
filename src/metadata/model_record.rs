//! Model Record - caller-supplied identity of the trained model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model Record describes the trained model being registered.
///
/// Only `name` is required. The optional fields mirror the descriptive
/// columns a passport server keeps per model (licensing, intended use,
/// known limitations, ...). Anything else goes into `attributes`.
///
/// A record is immutable once built; the assembler only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trl_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intended_users: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counter_indications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ethical_considerations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limitations: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fairness_constraints: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, serde_json::Value>,
}

impl ModelRecord {
    /// Create a model record carrying only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a builder for constructing a model record with optional fields.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ModelRecordBuilder {
        ModelRecordBuilder::new(name)
    }

    /// Get the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the model version, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Get the model tag, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Get the model type (e.g. "classification"), if any.
    #[must_use]
    pub fn model_type(&self) -> Option<&str> {
        self.model_type.as_deref()
    }

    /// Get the owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Get the license, if any.
    #[must_use]
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    /// Get the free-form attributes.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.attributes
    }
}

/// Builder for `ModelRecord`.
#[derive(Debug)]
pub struct ModelRecordBuilder {
    record: ModelRecord,
}

macro_rules! optional_setters {
    ($($(#[$doc:meta])* $field:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.record.$field = Some(value.into());
                self
            }
        )*
    };
}

impl ModelRecordBuilder {
    /// Create a new builder with the required name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            record: ModelRecord::new(name),
        }
    }

    optional_setters! {
        /// Set the model version.
        version,
        /// Set the model tag.
        tag,
        /// Set the model type.
        model_type,
        /// Set the product identifier.
        product_identifier,
        /// Set the owner.
        owner,
        /// Set the technology readiness level.
        trl_level,
        /// Set the license.
        license,
        /// Set the primary use.
        primary_use,
        /// Set the secondary use.
        secondary_use,
        /// Set the intended users.
        intended_users,
        /// Set counter indications.
        counter_indications,
        /// Set ethical considerations.
        ethical_considerations,
        /// Set known limitations.
        limitations,
        /// Set fairness constraints.
        fairness_constraints,
    }

    /// Add a free-form attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.record.attributes.insert(key.into(), value.into());
        self
    }

    /// Build the `ModelRecord`.
    #[must_use]
    pub fn build(self) -> ModelRecord {
        self.record
    }
}
