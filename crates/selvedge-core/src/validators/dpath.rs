//! `DpathValidator`

use serde_json::Value;

use super::{ValidationStrategy, Validator};
use crate::error::{Error, Result};
use crate::path::{self, Path};

/// Validates the values a field path resolves to.
///
/// The path must resolve. With a wildcard, every match is validated and the
/// first failing one is reported.
pub struct DpathValidator {
    field_path: Path,
    strategy: Box<dyn ValidationStrategy>,
}

impl DpathValidator {
    /// Build a validator; `field_path` must be non-empty
    pub fn new(field_path: Vec<String>, strategy: Box<dyn ValidationStrategy>) -> Result<Self> {
        Ok(Self {
            field_path: Path::new(field_path)?,
            strategy,
        })
    }
}

impl Validator for DpathValidator {
    fn validate(&self, data: &Value) -> Result<()> {
        let mut matched = 0usize;
        for value in path::values(data, &self.field_path) {
            matched += 1;
            self.strategy.validate(value)?;
        }

        if matched == 0 {
            return Err(Error::PathResolution {
                path: self.field_path.to_string(),
                reason: "path does not resolve in the given data".to_string(),
            });
        }
        tracing::debug!(path = %self.field_path, matched, "validated path");
        Ok(())
    }
}
