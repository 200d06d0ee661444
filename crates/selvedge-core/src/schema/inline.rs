//! Inline schema loader

use serde_json::Value;

use super::SchemaLoader;
use crate::error::{Error, Result};

/// Returns a fixed document verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct InlineSchemaLoader {
    schema: Value,
}

impl InlineSchemaLoader {
    /// Wrap `schema`, which must be a JSON object
    pub fn new(schema: Value) -> Result<Self> {
        if !schema.is_object() {
            return Err(Error::config(
                "InlineSchemaLoader",
                "schema must be a mapping",
            ));
        }
        Ok(Self { schema })
    }
}

impl SchemaLoader for InlineSchemaLoader {
    fn get_json_schema(&self) -> Result<Value> {
        Ok(self.schema.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_returns_schema_verbatim() {
        let schema = json!({"type": "object", "properties": {"id": {"type": "integer"}}});
        let loader = InlineSchemaLoader::new(schema.clone()).unwrap();
        assert_eq!(loader.get_json_schema().unwrap(), schema);
    }

    #[test]
    fn test_rejects_non_mapping() {
        assert!(InlineSchemaLoader::new(json!("not a schema")).is_err());
    }
}
