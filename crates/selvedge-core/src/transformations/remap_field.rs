//! `ConfigRemapField` transformation

use serde_json::{Map, Value};

use super::{Condition, ConfigTransformation};
use crate::error::{Error, Result};
use crate::interpolation::{Context, InterpolatedString};
use crate::mapping::InterpolatedValue;
use crate::path::{self, Path};

/// Replaces a field's value with its entry in a lookup map.
///
/// Values missing from the map, and paths missing from the config, leave
/// the config unchanged.
#[derive(Debug, Clone)]
pub struct ConfigRemapField {
    field_path: Vec<InterpolatedString>,
    map: InterpolatedValue,
    condition: Condition,
}

impl ConfigRemapField {
    /// Build a remap. `field_path` segments and `map` entries may be
    /// templated; they are evaluated against the config being transformed.
    pub fn new(field_path: Vec<String>, map: Map<String, Value>, condition: Condition) -> Result<Self> {
        if field_path.is_empty() {
            return Err(Error::config("ConfigRemapField", "field_path cannot be empty"));
        }
        if field_path.iter().any(|segment| segment == path::WILDCARD) {
            return Err(Error::config("ConfigRemapField", "field_path cannot contain a wildcard"));
        }
        let field_path = field_path
            .into_iter()
            .map(InterpolatedString::new)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            field_path,
            map: InterpolatedValue::new(Value::Object(map))?,
            condition,
        })
    }

    fn resolve_path(&self, ctx: &Context) -> Result<Path> {
        let segments = self
            .field_path
            .iter()
            .map(|segment| -> Result<String> {
                Ok(match segment.eval(ctx)? {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let path = Path::new(segments)?;
        if path.has_wildcard() {
            return Err(Error::config(
                "ConfigRemapField",
                format!("field_path '{}' resolved to a wildcard", path),
            ));
        }
        Ok(path)
    }
}

impl ConfigTransformation for ConfigRemapField {
    fn transform(&self, config: &mut Value) -> Result<()> {
        if !self.condition.holds(config)? {
            tracing::debug!("condition not met, skipping ConfigRemapField");
            return Ok(());
        }

        let ctx = Context::new(config.clone());
        let field_path = self.resolve_path(&ctx)?;

        let current = match path::get(config, &field_path) {
            Ok(Value::String(s)) => s.clone(),
            Ok(_) => return Ok(()),
            Err(_) => {
                tracing::debug!(path = %field_path, "field absent, nothing to remap");
                return Ok(());
            }
        };

        let map = self.map.eval(&ctx)?;
        match map.get(&current) {
            Some(replacement) => path::set(config, &field_path, replacement.clone()),
            None => {
                tracing::debug!(path = %field_path, value = %current, "value not in remap table");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remap(field_path: &[&str], map: Value) -> ConfigRemapField {
        ConfigRemapField::new(
            field_path.iter().map(|s| s.to_string()).collect(),
            map.as_object().cloned().unwrap(),
            Condition::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_field_is_remapped() {
        let mut config = json!({
            "authorization": {
                "auth_type": "client_credentials",
                "client_id": "12345",
                "client_secret": "secret"
            }
        });
        let original = config.clone();

        remap(
            &["authorization", "auth_type"],
            json!({"client_credentials": "oauth2", "api_key": "key_auth"}),
        )
        .transform(&mut config)
        .unwrap();

        assert_eq!(config["authorization"]["auth_type"], "oauth2");
        assert_eq!(original["authorization"]["auth_type"], "client_credentials");
        assert_eq!(config["authorization"]["client_id"], original["authorization"]["client_id"]);
        assert_eq!(
            config["authorization"]["client_secret"],
            original["authorization"]["client_secret"]
        );
    }

    #[test]
    fn test_value_not_in_map_leaves_config_unchanged() {
        let mut config = json!({
            "authorization": {"auth_type": "basic_auth", "username": "user", "password": "pass"}
        });
        let original = config.clone();
        remap(
            &["authorization", "auth_type"],
            json!({"client_credentials": "oauth2", "api_key": "key_auth"}),
        )
        .transform(&mut config)
        .unwrap();
        assert_eq!(config, original);
    }

    #[test]
    fn test_absent_path_leaves_config_unchanged() {
        let mut config = json!({"authorization": {"auth_type": "client_credentials"}});
        let original = config.clone();
        remap(&["authentication", "type"], json!({"client_credentials": "oauth2"}))
            .transform(&mut config)
            .unwrap();
        assert_eq!(config, original);
    }

    #[test]
    fn test_interpolated_path() {
        let mut config = json!({
            "auth_field_name": "type",
            "auth_data": {"type": "token", "token_value": "abc123"}
        });
        remap(
            &["auth_data", "{{ config['auth_field_name'] }}"],
            json!({"basic": "basic_auth", "token": "bearer"}),
        )
        .transform(&mut config)
        .unwrap();
        assert_eq!(config["auth_data"]["type"], "bearer");
    }

    #[test]
    fn test_empty_map_leaves_config_unchanged() {
        let mut config = json!({"authorization": {"auth_type": "client_credentials", "client_id": "12345"}});
        let original = config.clone();
        remap(&["authorization", "auth_type"], json!({}))
            .transform(&mut config)
            .unwrap();
        assert_eq!(config, original);
    }

    #[test]
    fn test_empty_field_path_rejected() {
        let result = ConfigRemapField::new(
            vec![],
            json!({"old_value": "new_value"}).as_object().cloned().unwrap(),
            Condition::default(),
        );
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
    }

    #[test]
    fn test_wildcard_field_path_rejected() {
        let result = ConfigRemapField::new(
            vec!["*".to_string(), "type".to_string()],
            json!({"a": "b"}).as_object().cloned().unwrap(),
            Condition::default(),
        );
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));

        let transformation = remap(&["{{ config.which }}", "type"], json!({"a": "b"}));
        let mut config = json!({"which": "*", "x": {"type": "a"}, "y": {"type": "a"}});
        let original = config.clone();
        assert!(matches!(
            transformation.transform(&mut config),
            Err(Error::ConfigInvalid { .. })
        ));
        assert_eq!(config, original);
    }

    #[test]
    fn test_sequential_remaps() {
        let mut config = json!({"auth": {"type": "oauth", "credentials": "secret"}, "environment": "dev"});
        remap(&["auth", "type"], json!({"api_key": "key_auth", "oauth": "oauth2"}))
            .transform(&mut config)
            .unwrap();
        remap(&["environment"], json!({"dev": "development", "prod": "production"}))
            .transform(&mut config)
            .unwrap();
        assert_eq!(config["auth"]["type"], "oauth2");
        assert_eq!(config["environment"], "development");
    }

    #[test]
    fn test_map_values_interpolated_against_config() {
        let endpoints = json!({
            "ES": "{{ 'https://sellingpartnerapi' if config.environment == 'production' else 'https://sandbox.sellingpartnerapi' }}-eu.amazon.com"
        });
        let transformation = remap(&["marketplace"], endpoints);

        let mut sandbox = json!({"environment": "sandbox", "marketplace": "ES"});
        let mut production = json!({"environment": "production", "marketplace": "ES"});
        transformation.transform(&mut sandbox).unwrap();
        transformation.transform(&mut production).unwrap();

        assert_eq!(sandbox["marketplace"], "https://sandbox.sellingpartnerapi-eu.amazon.com");
        assert_eq!(production["marketplace"], "https://sellingpartnerapi-eu.amazon.com");
    }

    #[test]
    fn test_condition_gates_remap() {
        let transformation = ConfigRemapField::new(
            vec!["mode".to_string()],
            json!({"a": "b"}).as_object().cloned().unwrap(),
            Condition::parse(Some("{{ config.enabled }}")).unwrap(),
        )
        .unwrap();

        let mut enabled = json!({"enabled": true, "mode": "a"});
        let mut disabled = json!({"enabled": false, "mode": "a"});
        transformation.transform(&mut enabled).unwrap();
        transformation.transform(&mut disabled).unwrap();
        assert_eq!(enabled["mode"], "b");
        assert_eq!(disabled["mode"], "a");
    }
}
