//! Error types for selvedge-core

use thiserror::Error;

/// Result type alias for selvedge-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in selvedge-core
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest file could not be found
    #[error("manifest file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML manifest
    #[error("failed to parse manifest: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// A component was constructed from an invalid definition
    #[error("invalid {component} configuration: {message}")]
    ConfigInvalid {
        /// Component type being constructed
        component: String,
        /// Description of what's invalid
        message: String,
    },

    /// Nothing in the document matched a path
    #[error("path not found: {path}")]
    PathNotFound {
        /// Path that failed to resolve
        path: String,
    },

    /// A validator could not resolve its field path
    #[error("Error validating path '{path}': {reason}")]
    PathResolution {
        /// Path that failed to resolve
        path: String,
        /// Why resolution failed
        reason: String,
    },

    /// An interpolated value could not be coerced to the declared type
    #[error("value '{value}' is of type {found}, expected {expected}")]
    TypeMismatch {
        /// Rendered form of the offending value
        value: String,
        /// Declared type
        expected: &'static str,
        /// Actual type
        found: &'static str,
    },

    /// An expression referenced something absent from its context
    #[error("undefined variable in expression '{expression}'")]
    UndefinedVariable {
        /// The expression that was evaluated
        expression: String,
    },

    /// Data did not adhere to a JSON Schema
    #[error("schema validation failed: {message}")]
    SchemaValidation {
        /// Summary of the violated constraints
        message: String,
    },

    /// A JSON Schema document is itself malformed
    #[error("invalid schema: {message}")]
    SchemaDefinition {
        /// Description of the schema problem
        message: String,
    },

    /// A validation strategy rejected a value
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the failure
        message: String,
    },

    /// Template rendering error
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error for the named component
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigInvalid {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Short JSON type name used in error messages
pub(crate) fn type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "int",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
