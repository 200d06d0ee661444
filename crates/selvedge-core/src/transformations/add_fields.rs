//! `ConfigAddFields` transformation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Condition, ConfigTransformation};
use crate::error::{Error, Result};
use crate::interpolation::{Context, InterpolatedString};
use crate::path::{self, Path};

/// One field to add, as written in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedFieldDefinition {
    /// Where to put the value
    pub path: Vec<String>,
    /// Literal text or an expression evaluated against the config
    pub value: Value,
}

#[derive(Debug, Clone)]
struct AddedField {
    path: Path,
    value: InterpolatedString,
}

/// Sets fields in the config, overwriting existing values
#[derive(Debug, Clone)]
pub struct ConfigAddFields {
    fields: Vec<AddedField>,
    condition: Condition,
}

impl ConfigAddFields {
    /// Build from field definitions. Every path must be non-empty and free
    /// of wildcards, and every value must be a string.
    pub fn new(fields: Vec<AddedFieldDefinition>, condition: Condition) -> Result<Self> {
        let fields = fields
            .into_iter()
            .map(|field| {
                if field.path.is_empty() {
                    return Err(Error::config("ConfigAddFields", "field path cannot be empty"));
                }
                let path = Path::new(&field.path)?;
                if path.has_wildcard() {
                    return Err(Error::config(
                        "ConfigAddFields",
                        format!("field path '{}' cannot contain a wildcard", path),
                    ));
                }
                match field.value {
                    Value::String(source) => Ok(AddedField {
                        path,
                        value: InterpolatedString::new(source)?,
                    }),
                    other => Err(Error::config(
                        "ConfigAddFields",
                        format!("value for '{}' must be a string or expression, got {}", path, other),
                    )),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { fields, condition })
    }
}

impl ConfigTransformation for ConfigAddFields {
    fn transform(&self, config: &mut Value) -> Result<()> {
        if !self.condition.holds(config)? {
            tracing::debug!("condition not met, skipping ConfigAddFields");
            return Ok(());
        }

        // Values see the config as it was before any field was added.
        let ctx = Context::new(config.clone());
        let values = self
            .fields
            .iter()
            .map(|field| field.value.eval(&ctx))
            .collect::<Result<Vec<_>>>()?;

        let mut updated = config.clone();
        for (field, value) in self.fields.iter().zip(values) {
            path::set(&mut updated, &field.path, value)?;
        }
        *config = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(path: &[&str], value: Value) -> AddedFieldDefinition {
        AddedFieldDefinition {
            path: path.iter().map(|s| s.to_string()).collect(),
            value,
        }
    }

    fn add(fields: Vec<AddedFieldDefinition>) -> ConfigAddFields {
        ConfigAddFields::new(fields, Condition::default()).unwrap()
    }

    #[test]
    fn test_static_values_added() {
        let transformation = add(vec![
            field(&["new_field"], json!("static_value")),
            field(&["another_field"], json!("another_value")),
        ]);
        let mut config = json!({});
        transformation.transform(&mut config).unwrap();
        assert_eq!(
            config,
            json!({"new_field": "static_value", "another_field": "another_value"})
        );
    }

    #[test]
    fn test_nested_fields_created() {
        let transformation = add(vec![field(&["parent", "child", "grandchild"], json!("nested_value"))]);
        let mut config = json!({});
        transformation.transform(&mut config).unwrap();
        assert_eq!(config, json!({"parent": {"child": {"grandchild": "nested_value"}}}));
    }

    #[test]
    fn test_interpolated_values_added() {
        let transformation = add(vec![
            field(&["derived_field"], json!("{{ config.original_field }}")),
            field(&["expression_result"], json!("{{ 2 * 3 }}")),
        ]);
        let mut config = json!({"original_field": "original_value"});
        transformation.transform(&mut config).unwrap();
        assert_eq!(
            config,
            json!({
                "original_field": "original_value",
                "derived_field": "original_value",
                "expression_result": 6
            })
        );
    }

    #[test]
    fn test_invalid_definitions_rejected() {
        assert!(matches!(
            ConfigAddFields::new(vec![field(&[], json!("value"))], Condition::default()),
            Err(Error::ConfigInvalid { .. })
        ));
        assert!(matches!(
            ConfigAddFields::new(vec![field(&["valid_path"], json!(123))], Condition::default()),
            Err(Error::ConfigInvalid { .. })
        ));
        assert!(ConfigAddFields::new(vec![field(&["items", "*"], json!("x"))], Condition::default()).is_err());
    }

    #[test]
    fn test_existing_value_overwritten() {
        let transformation = add(vec![field(&["existing_field"], json!("new_value"))]);
        let mut config = json!({"existing_field": "existing_value"});
        transformation.transform(&mut config).unwrap();
        assert_eq!(config["existing_field"], "new_value");
    }

    #[test]
    fn test_condition_gates_addition() {
        let transformation = ConfigAddFields::new(
            vec![field(&["conditional_field"], json!("added_value"))],
            Condition::parse(Some("{{ config.flag == true }}")).unwrap(),
        )
        .unwrap();

        let mut config_true = json!({"flag": true});
        transformation.transform(&mut config_true).unwrap();
        let mut config_false = json!({"flag": false});
        transformation.transform(&mut config_false).unwrap();

        assert!(config_true.get("conditional_field").is_some());
        assert!(config_false.get("conditional_field").is_none());
    }

    #[test]
    fn test_undefined_reference_fails_without_partial_write() {
        let transformation = add(vec![
            field(&["first"], json!("ok")),
            field(&["token"], json!("{{ config.missing }}")),
        ]);
        let mut config = json!({"other": 1});
        assert!(transformation.transform(&mut config).is_err());
        assert_eq!(config, json!({"other": 1}));
    }

    #[test]
    fn test_blocked_path_fails_without_partial_write() {
        let transformation = add(vec![
            field(&["added"], json!("x")),
            field(&["scalar", "child"], json!("y")),
        ]);
        let mut config = json!({"scalar": 1});
        assert!(matches!(
            transformation.transform(&mut config),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(config, json!({"scalar": 1}));
    }
}
