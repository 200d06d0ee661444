//! Declarative connector manifest
//!
//! A manifest describes how a user config is normalized and how each stream
//! loads its schema, paginates, and builds request parameters.
//!
//! # Example
//!
//! ```yaml
//! config_normalization_rules:
//!   transformations:
//!     - type: ConfigRemapField
//!       field_path: [environment]
//!       map: { prod: production }
//!   validations:
//!     - type: DpathValidator
//!       field_path: [api_key]
//!       validation_strategy:
//!         type: ValidateAdheresToSchema
//!         schema: { type: string }
//!
//! streams:
//!   - name: users
//!     parameters:
//!       path: /users
//!     schema_loader:
//!       type: InlineSchemaLoader
//!       schema:
//!         type: object
//!         properties:
//!           id: { type: integer }
//!     paginator:
//!       type: PageIncrement
//!       page_size: "{{ config.page_size }}"
//!     request_parameters:
//!       page: "{{ stream_slice.page }}"
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Error, Result};
use crate::mapping::RequestInputProvider;
use crate::pagination::{PaginationStrategy, PaginatorDefinition};
use crate::schema::{RetrieverRegistry, SchemaLoader, SchemaLoaderDefinition};
use crate::transformations::TransformationDefinition;
use crate::validators::ValidatorDefinition;

/// File name looked up when a directory is passed to [`Manifest::load`]
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Root manifest document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Rules applied to the user config before use
    #[serde(default)]
    pub config_normalization_rules: ConfigNormalizationRules,

    /// Stream definitions
    #[serde(default)]
    pub streams: Vec<StreamDefinition>,
}

/// Transformations run in order, then every validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigNormalizationRules {
    /// Config transformations
    #[serde(default)]
    pub transformations: Vec<TransformationDefinition>,

    /// Config validations
    #[serde(default)]
    pub validations: Vec<ValidatorDefinition>,
}

/// One stream as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Stream name
    pub name: String,

    /// Component parameters; values may be templated against config
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// How the stream's schema is produced
    pub schema_loader: SchemaLoaderDefinition,

    /// Pagination, if the stream is paginated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paginator: Option<PaginatorDefinition>,

    /// Request parameters, evaluated per stream slice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_parameters: Option<Map<String, Value>>,
}

/// A stream's components, built against a concrete config
pub struct Stream {
    name: String,
    schema_loader: Box<dyn SchemaLoader>,
    paginator: Option<Box<dyn PaginationStrategy>>,
    request_parameters: RequestInputProvider,
}

impl Stream {
    /// Stream name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema loader
    pub fn schema_loader(&self) -> &dyn SchemaLoader {
        self.schema_loader.as_ref()
    }

    /// Pagination strategy, if any
    pub fn paginator(&self) -> Option<&dyn PaginationStrategy> {
        self.paginator.as_deref()
    }

    /// Request parameter provider
    pub fn request_parameters(&self) -> &RequestInputProvider {
        &self.request_parameters
    }
}

impl Manifest {
    /// Load a manifest from a file, or from `manifest.yaml` inside a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let manifest_path = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };

        if !manifest_path.exists() {
            return Err(Error::ConfigNotFound {
                path: manifest_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&manifest_path)?;
        let manifest = Self::from_yaml(&contents)?;
        tracing::info!(
            path = %manifest_path.display(),
            streams = manifest.streams.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Parse a manifest from YAML text.
    ///
    /// Every transformation and validation strategy is built once here, so
    /// a malformed definition fails before any config is touched.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(contents)?;
        let rules = &manifest.config_normalization_rules;
        for definition in &rules.transformations {
            definition.build()?;
        }
        for definition in &rules.validations {
            definition.validation_strategy().build()?;
        }
        Ok(manifest)
    }

    /// Look up a stream definition by name
    pub fn stream(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Normalize `config` in place: every transformation in order, then
    /// every validation against the transformed config.
    ///
    /// The result is written back only when every step succeeds; on error
    /// `config` is left as it was.
    pub fn normalize_config(&self, config: &mut Value) -> Result<()> {
        let rules = &self.config_normalization_rules;
        let transformations = rules
            .transformations
            .iter()
            .map(TransformationDefinition::build)
            .collect::<Result<Vec<_>>>()?;

        let mut normalized = config.clone();
        for transformation in &transformations {
            transformation.transform(&mut normalized)?;
        }
        let validators = rules
            .validations
            .iter()
            .map(|definition| definition.build(&normalized))
            .collect::<Result<Vec<_>>>()?;
        for validator in &validators {
            validator.validate(&normalized)?;
        }
        *config = normalized;

        tracing::debug!(
            transformations = rules.transformations.len(),
            validations = rules.validations.len(),
            "normalized config"
        );
        Ok(())
    }

    /// Build the named stream against `config`. Dynamic schema loaders take
    /// their retriever from `retrievers`.
    pub fn build_stream(
        &self,
        name: &str,
        config: &Value,
        retrievers: &RetrieverRegistry,
    ) -> Result<Stream> {
        let definition = self
            .stream(name)
            .ok_or_else(|| Error::config("stream", format!("no stream named '{}'", name)))?;
        let parameters = &definition.parameters;

        let schema_loader = definition.schema_loader.build(config, parameters, retrievers)?;
        let paginator = definition
            .paginator
            .as_ref()
            .map(|p| p.build(config, parameters))
            .transpose()?;
        let request_parameters = RequestInputProvider::new(
            definition.request_parameters.clone(),
            config.clone(),
            parameters.clone(),
        )?;

        tracing::info!(stream = %name, paginated = paginator.is_some(), "built stream");
        Ok(Stream {
            name: definition.name.clone(),
            schema_loader,
            paginator,
            request_parameters,
        })
    }
}
