//! Interpolated mapping and value providers
//!
//! Templates are kept as-is and evaluated per call, so one template can be
//! reused for every stream slice. String leaves and object keys are
//! interpolated at every depth; other leaves are copied.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::interpolation::{Context, InterpolatedString};

/// Recursively interpolate every string leaf and object key of `template`
pub fn eval_value(template: &Value, ctx: &Context) -> Result<Value> {
    match template {
        Value::String(s) => InterpolatedString::new(s.as_str())?.eval(ctx),
        Value::Array(items) => items
            .iter()
            .map(|item| eval_value(item, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => eval_map(map, ctx).map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn eval_map(map: &Map<String, Value>, ctx: &Context) -> Result<Map<String, Value>> {
    let mut output = Map::with_capacity(map.len());
    for (key, value) in map {
        let key = match InterpolatedString::new(key.as_str())?.eval(ctx)? {
            Value::String(s) => s,
            other => other.to_string(),
        };
        output.insert(key, eval_value(value, ctx)?);
    }
    Ok(output)
}

fn check_syntax(template: &Value) -> Result<()> {
    match template {
        Value::String(s) => InterpolatedString::new(s.as_str()).map(|_| ()),
        Value::Array(items) => items.iter().try_for_each(check_syntax),
        Value::Object(map) => map.iter().try_for_each(|(key, value)| {
            InterpolatedString::new(key.as_str())?;
            check_syntax(value)
        }),
        _ => Ok(()),
    }
}

/// A single templated value of any shape
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedValue {
    template: Value,
}

impl InterpolatedValue {
    /// Wrap `template`, failing on malformed template syntax anywhere inside it
    pub fn new(template: Value) -> Result<Self> {
        check_syntax(&template)?;
        Ok(Self { template })
    }

    /// Evaluate against `ctx`, leaving the template untouched
    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        eval_value(&self.template, ctx)
    }
}

/// A templated mapping bound to component parameters.
///
/// An absent template evaluates to an empty mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterpolatedMapping {
    template: Map<String, Value>,
    parameters: Map<String, Value>,
}

impl InterpolatedMapping {
    /// Build a mapping provider
    pub fn new(template: Option<Map<String, Value>>, parameters: Map<String, Value>) -> Result<Self> {
        let template = template.unwrap_or_default();
        check_syntax(&Value::Object(template.clone()))?;
        Ok(Self {
            template,
            parameters,
        })
    }

    /// Evaluate against `config`, with `extra` bindings layered on top of
    /// config and parameters.
    pub fn eval(&self, config: &Value, extra: &Context) -> Result<Map<String, Value>> {
        let ctx = Context::new(config.clone())
            .with_parameters(&self.parameters)?
            .layered(extra);
        eval_map(&self.template, &ctx)
    }
}

/// Evaluates request inputs (query parameters, headers, body fields) per
/// stream slice.
#[derive(Debug, Clone)]
pub struct RequestInputProvider {
    inputs: InterpolatedMapping,
    config: Value,
}

impl RequestInputProvider {
    /// Build a provider for `request_inputs`
    pub fn new(
        request_inputs: Option<Map<String, Value>>,
        config: Value,
        parameters: Map<String, Value>,
    ) -> Result<Self> {
        Ok(Self {
            inputs: InterpolatedMapping::new(request_inputs, parameters)?,
            config,
        })
    }

    /// Evaluate the inputs for one stream slice
    pub fn eval_request_inputs(&self, stream_slice: Option<&Value>) -> Result<Map<String, Value>> {
        let extra = match stream_slice {
            Some(slice) => Context::default().with_stream_slice(slice.clone()),
            None => Context::default(),
        };
        self.inputs.eval(&self.config, &extra)
    }
}
