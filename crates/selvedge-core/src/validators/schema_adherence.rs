//! `ValidateAdheresToSchema` strategy

use serde_json::Value;

use super::ValidationStrategy;
use crate::error::{Error, Result};

/// Checks values against a JSON Schema.
///
/// A string value is parsed as JSON before it is checked.
pub struct ValidateAdheresToSchema {
    validator: jsonschema::Validator,
}

impl ValidateAdheresToSchema {
    /// Compile `schema`, failing with [`Error::SchemaDefinition`] if the
    /// schema itself is malformed
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::Validator::new(schema).map_err(|e| Error::SchemaDefinition {
            message: e.to_string(),
        })?;
        Ok(Self { validator })
    }
}

impl std::fmt::Debug for ValidateAdheresToSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidateAdheresToSchema").finish_non_exhaustive()
    }
}

impl ValidationStrategy for ValidateAdheresToSchema {
    fn validate(&self, value: &Value) -> Result<()> {
        let parsed;
        let instance = match value {
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text)?;
                &parsed
            }
            other => other,
        };

        if self.validator.is_valid(instance) {
            return Ok(());
        }
        let errors: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|e| e.to_string())
            .collect();
        Err(Error::SchemaValidation {
            message: errors.join("; "),
        })
    }
}
