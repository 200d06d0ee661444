//! Selvedge Core Library
//!
//! This crate provides the declarative evaluation core for Selvedge
//! connectors:
//! - Path addressing over JSON documents
//! - Expression interpolation against config, parameters, and slices
//! - Page-increment pagination
//! - Inline, dynamic, and composite schema loading
//! - Config transformations and validators
//!
//! Transport, authentication, and record extraction live elsewhere; this
//! crate only evaluates what a manifest declares.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Manifest   │────▶│  Normalize  │────▶│   Stream    │
//! │   (YAML)    │     │   Config    │     │ Components  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     transformations      schema loader
//!                     validators           paginator
//!                                          request inputs
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use selvedge_core::{Manifest, RetrieverRegistry};
//!
//! let manifest = Manifest::load("./manifest.yaml")?;
//! let mut config = serde_json::json!({"api_key": "secret"});
//! manifest.normalize_config(&mut config)?;
//!
//! let stream = manifest.build_stream("users", &config, &RetrieverRegistry::new())?;
//! let schema = stream.schema_loader().get_json_schema()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod interpolation;
pub mod manifest;
pub mod mapping;
pub mod pagination;
pub mod path;
pub mod schema;
pub mod transformations;
pub mod validators;

pub use error::{Error, Result};
pub use interpolation::{Context, InterpolatedBoolean, InterpolatedString};
pub use manifest::{Manifest, Stream, StreamDefinition};
pub use mapping::{InterpolatedMapping, InterpolatedValue, RequestInputProvider};
pub use pagination::{PageIncrement, PaginationStrategy};
pub use path::Path;
pub use schema::{Retriever, RetrieverRegistry, SchemaLoader};
pub use transformations::ConfigTransformation;
pub use validators::{ValidationStrategy, Validator};
