//! `ConfigRemoveFields` transformation

use serde_json::Value;

use super::{Condition, ConfigTransformation};
use crate::error::Result;
use crate::path::{self, Path};

/// Deletes fields from the config. Absent fields are skipped.
#[derive(Debug, Clone)]
pub struct ConfigRemoveFields {
    field_pointers: Vec<Path>,
    condition: Condition,
}

impl ConfigRemoveFields {
    /// Build from field pointers; each must be non-empty
    pub fn new(field_pointers: Vec<Vec<String>>, condition: Condition) -> Result<Self> {
        let field_pointers = field_pointers
            .into_iter()
            .map(Path::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            field_pointers,
            condition,
        })
    }
}

impl ConfigTransformation for ConfigRemoveFields {
    fn transform(&self, config: &mut Value) -> Result<()> {
        if !self.condition.holds(config)? {
            tracing::debug!("condition not met, skipping ConfigRemoveFields");
            return Ok(());
        }

        for pointer in &self.field_pointers {
            let removed = path::delete(config, pointer);
            tracing::debug!(path = %pointer, removed, "removed config fields");
        }
        Ok(())
    }
}
