//! Composite schema loader
//!
//! Merges the output of several loaders in order. A property defined by an
//! earlier loader is never replaced by a later one; when both definitions
//! are objects with nested `properties`, those nested properties are merged
//! by the same rule. `$schema` and `type` come from the first loader that
//! sets them.

use serde_json::{Map, Value};

use super::SchemaLoader;
use crate::error::{Error, Result};

const INHERITED_KEYS: [&str; 2] = ["$schema", "type"];

/// Merges several loaders, first writer wins
pub struct CompositeSchemaLoader {
    loaders: Vec<Box<dyn SchemaLoader>>,
}

impl CompositeSchemaLoader {
    /// Build from loaders in precedence order
    pub fn new(loaders: Vec<Box<dyn SchemaLoader>>) -> Result<Self> {
        if loaders.is_empty() {
            return Err(Error::config(
                "CompositeSchemaLoader",
                "at least one schema loader is required",
            ));
        }
        Ok(Self { loaders })
    }
}

impl SchemaLoader for CompositeSchemaLoader {
    fn get_json_schema(&self) -> Result<Value> {
        let mut merged = Map::new();
        let mut properties = Map::new();

        for loader in &self.loaders {
            let schema = loader.get_json_schema()?;
            for key in INHERITED_KEYS {
                if let Some(value) = schema.get(key) {
                    merged.entry(key).or_insert_with(|| value.clone());
                }
            }
            if let Some(Value::Object(incoming)) = schema.get("properties") {
                merge_properties(&mut properties, incoming);
            }
        }

        merged.insert("properties".to_string(), Value::Object(properties));
        Ok(Value::Object(merged))
    }
}

fn merge_properties(existing: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        let Some(current) = existing.get_mut(key) else {
            existing.insert(key.clone(), value.clone());
            continue;
        };
        match (nested_properties_mut(current), nested_properties(value)) {
            (Some(current_nested), Some(incoming_nested)) => {
                merge_properties(current_nested, incoming_nested);
            }
            _ => tracing::warn!(property = %key, "keeping earlier definition, discarding later one"),
        }
    }
}

fn nested_properties(value: &Value) -> Option<&Map<String, Value>> {
    value.get("properties")?.as_object()
}

fn nested_properties_mut(value: &mut Value) -> Option<&mut Map<String, Value>> {
    value.get_mut("properties")?.as_object_mut()
}
