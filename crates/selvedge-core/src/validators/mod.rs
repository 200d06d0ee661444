//! Validators
//!
//! A validator locates a value and hands it to a [`ValidationStrategy`],
//! which decides whether the value is acceptable. Strategy failures
//! propagate unchanged.
//!
//! # Built-in Validators
//!
//! - `DpathValidator` - Validates every value matched by a field path
//! - `PredicateValidator` - Validates a value bound at construction
//!
//! # Built-in Strategies
//!
//! - `ValidateAdheresToSchema` - Checks a document against a JSON Schema
//!
//! # Example
//!
//! ```yaml
//! validations:
//!   - type: DpathValidator
//!     field_path: [credentials]
//!     validation_strategy:
//!       type: ValidateAdheresToSchema
//!       schema:
//!         type: object
//!         required: [api_key]
//! ```

mod dpath;
mod predicate;
mod schema_adherence;

pub use dpath::DpathValidator;
pub use predicate::PredicateValidator;
pub use schema_adherence::ValidateAdheresToSchema;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::interpolation::Context;
use crate::mapping::eval_value;

/// Decides whether a single value is acceptable
pub trait ValidationStrategy: Send + Sync {
    /// Fail if `value` is not acceptable
    fn validate(&self, value: &Value) -> Result<()>;
}

/// Validates some part of a document
pub trait Validator: Send + Sync {
    /// Fail if `data` is not acceptable
    fn validate(&self, data: &Value) -> Result<()>;
}

/// Strategy definition as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValidationStrategyDefinition {
    /// JSON Schema adherence
    ValidateAdheresToSchema {
        /// Schema document
        schema: Value,
    },
}

impl ValidationStrategyDefinition {
    /// Construct the strategy this definition describes
    pub fn build(&self) -> Result<Box<dyn ValidationStrategy>> {
        match self {
            Self::ValidateAdheresToSchema { schema } => {
                Ok(Box::new(ValidateAdheresToSchema::new(schema)?))
            }
        }
    }
}

/// Validator definition as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValidatorDefinition {
    /// Validate values located by a path
    DpathValidator {
        /// Path to validate; may contain wildcards
        field_path: Vec<String>,
        /// Strategy applied to each match
        validation_strategy: ValidationStrategyDefinition,
    },

    /// Validate a fixed value, interpolated against the config
    PredicateValidator {
        /// Value to validate
        value: Value,
        /// Strategy applied to the value
        validation_strategy: ValidationStrategyDefinition,
    },
}

impl ValidatorDefinition {
    /// Strategy this validator delegates to
    pub fn validation_strategy(&self) -> &ValidationStrategyDefinition {
        match self {
            Self::DpathValidator {
                validation_strategy,
                ..
            }
            | Self::PredicateValidator {
                validation_strategy,
                ..
            } => validation_strategy,
        }
    }

    /// Construct the validator this definition describes.
    ///
    /// A `PredicateValidator` value is interpolated against `config` here,
    /// once.
    pub fn build(&self, config: &Value) -> Result<Box<dyn Validator>> {
        match self {
            Self::DpathValidator {
                field_path,
                validation_strategy,
            } => Ok(Box::new(DpathValidator::new(
                field_path.clone(),
                validation_strategy.build()?,
            )?)),
            Self::PredicateValidator {
                value,
                validation_strategy,
            } => {
                let value = eval_value(value, &Context::new(config.clone()))?;
                Ok(Box::new(PredicateValidator::new(value, validation_strategy.build()?)))
            }
        }
    }
}

/// A predicate validator ignores the data it is handed; its value was bound
/// at construction.
impl Validator for PredicateValidator {
    fn validate(&self, _data: &Value) -> Result<()> {
        PredicateValidator::validate(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use std::sync::Mutex;

    /// Strategy that records what it was asked to validate
    #[derive(Default)]
    pub(crate) struct RecordingStrategy {
        pub(crate) fail_with: Option<String>,
        pub(crate) seen: Mutex<Vec<Value>>,
    }

    impl RecordingStrategy {
        pub(crate) fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }
    }

    impl ValidationStrategy for std::sync::Arc<RecordingStrategy> {
        fn validate(&self, value: &Value) -> Result<()> {
            self.seen.lock().unwrap().push(value.clone());
            match &self.fail_with {
                Some(message) => Err(Error::Validation {
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_parse_validator_definitions() {
        let yaml = r#"
- type: DpathValidator
  field_path: [credentials]
  validation_strategy:
    type: ValidateAdheresToSchema
    schema:
      type: object
      required: [api_key]
- type: PredicateValidator
  value:
    region: "{{ config.region }}"
  validation_strategy:
    type: ValidateAdheresToSchema
    schema:
      type: object
      properties:
        region:
          enum: [us, eu]
"#;
        let definitions: Vec<ValidatorDefinition> = serde_yaml::from_str(yaml).unwrap();
        let config = json!({"credentials": {"api_key": "k"}, "region": "eu"});
        for definition in &definitions {
            definition.build(&config).unwrap().validate(&config).unwrap();
        }

        let bad = json!({"credentials": {}, "region": "apac"});
        for definition in &definitions {
            assert!(definition.build(&bad).unwrap().validate(&bad).is_err());
        }
    }

    #[test]
    fn test_invalid_strategy_schema_fails_at_build() {
        let definition = ValidatorDefinition::DpathValidator {
            field_path: vec!["a".to_string()],
            validation_strategy: ValidationStrategyDefinition::ValidateAdheresToSchema {
                schema: json!({"type": "invalid_type"}),
            },
        };
        assert!(matches!(
            definition.build(&json!({})),
            Err(Error::SchemaDefinition { .. })
        ));
    }
}
