//! Dynamic schema loader
//!
//! Some APIs describe their own fields through a metadata endpoint. The
//! loader drains a [`Retriever`] for those descriptor records and turns each
//! descriptor into a nullable property. When the same field is described
//! more than once, the last description wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use super::{DRAFT_07, SchemaLoader};
use crate::error::{Error, Result, type_name};
use crate::interpolation::{Context, InterpolatedBoolean, InterpolatedString};
use crate::path::{self, Path};

/// Source of records, implemented by the transport layer
pub trait Retriever: Send + Sync {
    /// Read every record. The sequence is finite and may be lazy.
    fn read_records(&self) -> Box<dyn Iterator<Item = Result<Value>> + '_>;
}

impl Retriever for Vec<Value> {
    fn read_records(&self) -> Box<dyn Iterator<Item = Result<Value>> + '_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}

/// One type token or several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeTokens {
    /// A single token such as `"string"`
    One(String),
    /// Several tokens such as `["integer", "null"]`
    Many(Vec<String>),
}

impl TypeTokens {
    fn into_vec(self) -> Vec<String> {
        match self {
            TypeTokens::One(t) => vec![t],
            TypeTokens::Many(ts) => ts,
        }
    }
}

/// Translation from a source type token to JSON Schema types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesMapDefinition {
    /// JSON Schema type(s) to emit
    pub target_type: TypeTokens,
    /// Source token(s) this entry applies to
    pub current_type: TypeTokens,
    /// Optional condition, evaluated with the descriptor bound as `record`
    #[serde(default)]
    pub condition: Option<String>,
}

/// Where to find field descriptors and their parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaTypeIdentifierDefinition {
    /// Path to the descriptors within each record; empty means the record itself
    #[serde(default)]
    pub schema_pointer: Vec<String>,
    /// Path to the field name within a descriptor
    pub key_pointer: Vec<String>,
    /// Path to the field type within a descriptor; absent means `string`
    #[serde(default)]
    pub type_pointer: Option<Vec<String>>,
    /// Source token translations, first match wins
    #[serde(default)]
    pub types_mapping: Vec<TypesMapDefinition>,
}

/// `DynamicSchemaLoader` definition as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicSchemaLoaderDefinition {
    /// Name of the retriever to drain
    pub retriever: String,
    /// Descriptor layout
    pub schema_type_identifier: SchemaTypeIdentifierDefinition,
}

#[derive(Debug, Clone)]
struct TypesMap {
    current: Vec<String>,
    target: Vec<String>,
    condition: Option<InterpolatedBoolean>,
}

/// Discovers properties from descriptor records
pub struct DynamicSchemaLoader {
    retriever: Arc<dyn Retriever>,
    context: Context,
    schema_pointer: Option<Path>,
    key_pointer: Path,
    type_pointer: Option<Path>,
    types_mapping: Vec<TypesMap>,
}

impl std::fmt::Debug for DynamicSchemaLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicSchemaLoader")
            .field("schema_pointer", &self.schema_pointer)
            .field("key_pointer", &self.key_pointer)
            .field("type_pointer", &self.type_pointer)
            .finish_non_exhaustive()
    }
}

impl DynamicSchemaLoader {
    /// Build a loader. Pointer segments may be templated; they are resolved
    /// here against `config` and `parameters`.
    pub fn new(
        definition: &DynamicSchemaLoaderDefinition,
        retriever: Arc<dyn Retriever>,
        config: &Value,
        parameters: &Map<String, Value>,
    ) -> Result<Self> {
        let context = Context::new(config.clone()).with_parameters(parameters)?;
        let identifier = &definition.schema_type_identifier;

        let schema_pointer = if identifier.schema_pointer.is_empty() {
            None
        } else {
            Some(resolve_pointer(&identifier.schema_pointer, &context)?)
        };
        let key_pointer = resolve_pointer(&identifier.key_pointer, &context)?;
        let type_pointer = identifier
            .type_pointer
            .as_ref()
            .map(|p| resolve_pointer(p, &context))
            .transpose()?;

        let types_mapping = identifier
            .types_mapping
            .iter()
            .map(|m| -> Result<TypesMap> {
                Ok(TypesMap {
                    current: m.current_type.clone().into_vec(),
                    target: m.target_type.clone().into_vec(),
                    condition: m.condition.clone().map(InterpolatedBoolean::new).transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            retriever,
            context,
            schema_pointer,
            key_pointer,
            type_pointer,
            types_mapping,
        })
    }

    fn descriptors<'a>(&self, record: &'a Value) -> Vec<&'a Value> {
        let found: Vec<&Value> = match &self.schema_pointer {
            None => vec![record],
            Some(pointer) => path::values(record, pointer).collect(),
        };
        found
            .into_iter()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .collect()
    }

    fn field_type(&self, descriptor: &Value) -> Result<Value> {
        let raw = match &self.type_pointer {
            None => vec!["string".to_string()],
            Some(pointer) => match path::get(descriptor, pointer) {
                Ok(Value::String(t)) => vec![t.clone()],
                Ok(Value::Array(items)) => items
                    .iter()
                    .map(|t| {
                        t.as_str().map(str::to_string).ok_or_else(|| Error::TypeMismatch {
                            value: t.to_string(),
                            expected: "string",
                            found: type_name(t),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
                Ok(other) => {
                    return Err(Error::TypeMismatch {
                        value: other.to_string(),
                        expected: "string",
                        found: type_name(other),
                    });
                }
                Err(_) => {
                    tracing::warn!(pointer = %pointer, "descriptor has no type; using string");
                    vec!["string".to_string()]
                }
            },
        };

        let mut types = vec!["null".to_string()];
        for token in raw {
            for mapped in self.map_token(&token, descriptor)? {
                if !types.contains(&mapped) {
                    types.push(mapped);
                }
            }
        }
        Ok(json!(types))
    }

    fn map_token(&self, token: &str, descriptor: &Value) -> Result<Vec<String>> {
        for mapping in &self.types_mapping {
            if !mapping.current.iter().any(|c| c == token) {
                continue;
            }
            let applies = match &mapping.condition {
                None => true,
                Some(condition) => {
                    let ctx = self.context.clone().with_record(descriptor.clone());
                    condition.eval(&ctx)?
                }
            };
            if applies {
                return Ok(mapping.target.clone());
            }
        }
        Ok(vec![token.to_string()])
    }
}

fn resolve_pointer(segments: &[String], ctx: &Context) -> Result<Path> {
    let resolved = segments
        .iter()
        .map(|segment| -> Result<String> {
            Ok(match InterpolatedString::new(segment.as_str())?.eval(ctx)? {
                Value::String(s) => s,
                other => other.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Path::new(resolved)
}

impl SchemaLoader for DynamicSchemaLoader {
    fn get_json_schema(&self) -> Result<Value> {
        let mut properties = Map::new();
        let mut records = 0usize;

        for record in self.retriever.read_records() {
            let record = record?;
            records += 1;
            for descriptor in self.descriptors(&record) {
                let key = match path::get(descriptor, &self.key_pointer) {
                    Ok(Value::String(k)) => k.clone(),
                    Ok(other) => other.to_string(),
                    Err(_) => {
                        tracing::warn!(pointer = %self.key_pointer, "skipping descriptor without a key");
                        continue;
                    }
                };
                let field_type = self.field_type(descriptor)?;
                properties.insert(key, json!({ "type": field_type }));
            }
        }

        tracing::info!(
            records,
            properties = properties.len(),
            "discovered schema properties"
        );

        Ok(json!({
            "$schema": DRAFT_07,
            "type": "object",
            "additionalProperties": true,
            "properties": properties,
        }))
    }
}
