//! Config transformations
//!
//! Transformations normalize a user-supplied connector config in place
//! before it is validated and used.
//!
//! # Built-in Transformations
//!
//! - `ConfigAddFields` - Set fields to literal or interpolated values
//! - `ConfigRemapField` - Translate a field's value through a lookup map
//! - `ConfigRemoveFields` - Delete fields, skipping any that are absent
//!
//! Each accepts an optional `condition`. When it evaluates false against the
//! config, the transformation leaves the config alone.
//!
//! # Example
//!
//! ```yaml
//! transformations:
//!   - type: ConfigRemapField
//!     field_path: [authorization, auth_type]
//!     map:
//!       client_credentials: oauth2
//!
//!   - type: ConfigAddFields
//!     fields:
//!       - path: [base_url]
//!         value: "https://{{ config.region }}.example.com"
//!
//!   - type: ConfigRemoveFields
//!     condition: "{{ config.sandbox == false }}"
//!     field_pointers:
//!       - [sandbox_token]
//! ```

mod add_fields;
mod remap_field;
mod remove_fields;

pub use add_fields::{AddedFieldDefinition, ConfigAddFields};
pub use remap_field::ConfigRemapField;
pub use remove_fields::ConfigRemoveFields;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::interpolation::{Context, InterpolatedBoolean};

/// Mutates a config in place
pub trait ConfigTransformation: Send + Sync {
    /// Apply the transformation to `config`
    fn transform(&self, config: &mut Value) -> Result<()>;
}

/// Transformation definition as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransformationDefinition {
    /// Add or overwrite fields
    ConfigAddFields {
        /// Fields to set, applied in order
        fields: Vec<AddedFieldDefinition>,
        /// Optional guard
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },

    /// Remap one field's value
    ConfigRemapField {
        /// Path to the field; segments may be templated
        field_path: Vec<String>,
        /// Old value to new value
        #[serde(default)]
        map: Map<String, Value>,
        /// Optional guard
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },

    /// Remove fields
    ConfigRemoveFields {
        /// Paths to delete
        field_pointers: Vec<Vec<String>>,
        /// Optional guard
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
}

impl TransformationDefinition {
    /// Construct the transformation this definition describes
    pub fn build(&self) -> Result<Box<dyn ConfigTransformation>> {
        Ok(match self {
            Self::ConfigAddFields { fields, condition } => Box::new(ConfigAddFields::new(
                fields.clone(),
                Condition::parse(condition.as_deref())?,
            )?),
            Self::ConfigRemapField {
                field_path,
                map,
                condition,
            } => Box::new(ConfigRemapField::new(
                field_path.clone(),
                map.clone(),
                Condition::parse(condition.as_deref())?,
            )?),
            Self::ConfigRemoveFields {
                field_pointers,
                condition,
            } => Box::new(ConfigRemoveFields::new(
                field_pointers.clone(),
                Condition::parse(condition.as_deref())?,
            )?),
        })
    }
}

/// Guard shared by all transformations; always true when absent
#[derive(Debug, Clone, PartialEq)]
pub struct Condition(InterpolatedBoolean);

impl Condition {
    /// Parse an optional condition string
    pub fn parse(condition: Option<&str>) -> Result<Self> {
        match condition {
            Some(c) => Ok(Self(InterpolatedBoolean::new(c)?)),
            None => Ok(Self::default()),
        }
    }

    /// Evaluate against `config`
    pub fn holds(&self, config: &Value) -> Result<bool> {
        self.0.eval(&Context::new(config.clone()))
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self(InterpolatedBoolean::from(true))
    }
}
