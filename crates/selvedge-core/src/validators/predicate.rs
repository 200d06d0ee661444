//! `PredicateValidator`

use serde_json::Value;

use super::ValidationStrategy;
use crate::error::Result;

/// Validates a value bound at construction
pub struct PredicateValidator {
    value: Value,
    strategy: Box<dyn ValidationStrategy>,
}

impl PredicateValidator {
    /// Bind `value` to `strategy`
    pub fn new(value: Value, strategy: Box<dyn ValidationStrategy>) -> Self {
        Self { value, strategy }
    }

    /// The bound value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Run the strategy against the bound value
    pub fn validate(&self) -> Result<()> {
        self.strategy.validate(&self.value)
    }
}
