//! Schema loaders
//!
//! A schema loader produces the JSON Schema describing a stream's records.
//!
//! # Built-in Loaders
//!
//! - `InlineSchemaLoader` - a fixed document from the manifest
//! - `DynamicSchemaLoader` - properties discovered from records a retriever yields
//! - `CompositeSchemaLoader` - several loaders merged, earlier loaders taking precedence
//!
//! # Example
//!
//! ```yaml
//! schema_loader:
//!   type: CompositeSchemaLoader
//!   schema_loaders:
//!     - type: InlineSchemaLoader
//!       schema:
//!         type: object
//!         properties:
//!           id: { type: integer }
//!     - type: DynamicSchemaLoader
//!       retriever: fields_endpoint
//!       schema_type_identifier:
//!         schema_pointer: [fields]
//!         key_pointer: [name]
//!         type_pointer: [type]
//! ```

mod composite;
mod dynamic;
mod inline;

pub use composite::CompositeSchemaLoader;
pub use dynamic::{
    DynamicSchemaLoader, DynamicSchemaLoaderDefinition, Retriever, SchemaTypeIdentifierDefinition,
    TypeTokens, TypesMapDefinition,
};
pub use inline::InlineSchemaLoader;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};

/// `$schema` URI stamped on generated documents
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Retrievers available to dynamic loaders, by name
pub type RetrieverRegistry = HashMap<String, Arc<dyn Retriever>>;

/// Produces a JSON Schema document
pub trait SchemaLoader: Send + Sync {
    /// Build the schema document
    fn get_json_schema(&self) -> Result<Value>;
}

/// Schema loader definition as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SchemaLoaderDefinition {
    /// Fixed schema document
    InlineSchemaLoader {
        /// The document
        #[serde(default = "empty_object")]
        schema: Value,
    },

    /// Properties discovered at runtime
    DynamicSchemaLoader(DynamicSchemaLoaderDefinition),

    /// Ordered merge of other loaders
    CompositeSchemaLoader {
        /// Loaders in precedence order
        schema_loaders: Vec<SchemaLoaderDefinition>,
    },
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl SchemaLoaderDefinition {
    /// Construct the loader this definition describes
    pub fn build(
        &self,
        config: &Value,
        parameters: &Map<String, Value>,
        retrievers: &RetrieverRegistry,
    ) -> Result<Box<dyn SchemaLoader>> {
        match self {
            Self::InlineSchemaLoader { schema } => Ok(Box::new(InlineSchemaLoader::new(schema.clone())?)),
            Self::DynamicSchemaLoader(definition) => {
                let retriever = retrievers.get(&definition.retriever).cloned().ok_or_else(|| {
                    Error::config(
                        "DynamicSchemaLoader",
                        format!("unknown retriever '{}'", definition.retriever),
                    )
                })?;
                Ok(Box::new(DynamicSchemaLoader::new(
                    definition, retriever, config, parameters,
                )?))
            }
            Self::CompositeSchemaLoader { schema_loaders } => {
                let loaders = schema_loaders
                    .iter()
                    .map(|d| d.build(config, parameters, retrievers))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Box::new(CompositeSchemaLoader::new(loaders)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_inline_definition() {
        let yaml = r#"
type: InlineSchemaLoader
schema:
  type: object
  properties:
    id:
      type: integer
"#;
        let definition: SchemaLoaderDefinition = serde_yaml::from_str(yaml).unwrap();
        let loader = definition
            .build(&json!({}), &Map::new(), &RetrieverRegistry::new())
            .unwrap();
        assert_eq!(
            loader.get_json_schema().unwrap()["properties"]["id"],
            json!({"type": "integer"})
        );
    }

    #[test]
    fn test_parse_composite_with_dynamic_definition() {
        let yaml = r#"
type: CompositeSchemaLoader
schema_loaders:
  - type: InlineSchemaLoader
    schema:
      type: object
      properties:
        id: { type: integer }
  - type: DynamicSchemaLoader
    retriever: fields
    schema_type_identifier:
      schema_pointer: [schema]
      key_pointer: [key]
      type_pointer: [type]
"#;
        let definition: SchemaLoaderDefinition = serde_yaml::from_str(yaml).unwrap();
        let mut retrievers = RetrieverRegistry::new();
        let records: Arc<dyn Retriever> =
            Arc::new(vec![json!({"schema": [{"key": "name", "type": "string"}]})]);
        retrievers.insert("fields".to_string(), records);

        let loader = definition.build(&json!({}), &Map::new(), &retrievers).unwrap();
        let schema = loader.get_json_schema().unwrap();
        assert_eq!(schema["properties"]["id"], json!({"type": "integer"}));
        assert_eq!(schema["properties"]["name"], json!({"type": ["null", "string"]}));
    }

    #[test]
    fn test_unknown_retriever_fails_at_build() {
        let yaml = r#"
type: DynamicSchemaLoader
retriever: missing
schema_type_identifier:
  key_pointer: [name]
"#;
        let definition: SchemaLoaderDefinition = serde_yaml::from_str(yaml).unwrap();
        let result = definition.build(&json!({}), &Map::new(), &RetrieverRegistry::new());
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
    }
}
