//! Expression interpolation
//!
//! Strings containing `{{ ... }}` markers are evaluated with Jinja syntax
//! against a [`Context`]. Everything else passes through untouched, so a
//! literal `2` stays an integer and `"static"` stays a string.
//!
//! A string that is exactly one `{{ expr }}` block evaluates to the typed
//! result of `expr`. Strings mixing markers and literal text render to text,
//! and the text is then read back as a JSON literal when it is one, so
//! `"{{ 2 * 3 }}"` and `"{{ 2 }}{{ 3 }}"` yield `6` and `23` respectively.
//!
//! # Example
//!
//! ```rust
//! use selvedge_core::interpolation::{Context, InterpolatedString};
//! use serde_json::json;
//!
//! let ctx = Context::new(json!({"page_size": 50}));
//! let expr = InterpolatedString::new("{{ config['page_size'] * 2 }}").unwrap();
//! assert_eq!(expr.eval(&ctx).unwrap(), json!(100));
//! ```

mod macros;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result, type_name};

/// Context variable holding the connector configuration
pub const CONFIG: &str = "config";
/// Context variable holding component-local parameters
pub const PARAMETERS: &str = "parameters";
/// Context variable holding the current stream slice
pub const STREAM_SLICE: &str = "stream_slice";
/// Context variable holding the current record
pub const RECORD: &str = "record";

static ENVIRONMENT: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    macros::register(&mut env);
    env
});

static SINGLE_EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*\{\{(.*)\}\}\s*$").expect("valid regex"));

/// Named variables visible to an expression.
///
/// Only `config`, `parameters`, `stream_slice` and `record` can be bound.
/// When two contexts are layered, bindings from the later one win.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context {
    vars: BTreeMap<&'static str, Value>,
}

impl Context {
    /// Context with `config` bound and an empty `parameters` namespace
    pub fn new(config: Value) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert(CONFIG, config);
        vars.insert(PARAMETERS, Value::Object(Map::new()));
        Self { vars }
    }

    /// Bind `parameters`, resolving any templated values against the
    /// bindings already present.
    pub fn with_parameters(mut self, parameters: &Map<String, Value>) -> Result<Self> {
        let resolved = crate::mapping::eval_value(&Value::Object(parameters.clone()), &self)?;
        self.vars.insert(PARAMETERS, resolved);
        Ok(self)
    }

    /// Bind `stream_slice`
    pub fn with_stream_slice(mut self, stream_slice: Value) -> Self {
        self.vars.insert(STREAM_SLICE, stream_slice);
        self
    }

    /// Bind `record`
    pub fn with_record(mut self, record: Value) -> Self {
        self.vars.insert(RECORD, record);
        self
    }

    /// Overlay `other` on top of this context
    pub fn layered(mut self, other: &Context) -> Self {
        for (name, value) in &other.vars {
            self.vars.insert(name, value.clone());
        }
        self
    }

    /// Look up a bound variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// The bound configuration, or `null`
    pub fn config(&self) -> &Value {
        self.vars.get(CONFIG).unwrap_or(&Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Literal,
    Expression(String),
    Template,
}

/// A string that may contain template markers.
///
/// Syntax is checked when the value is constructed; evaluation happens per
/// context.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedString {
    source: String,
    kind: Kind,
}

impl InterpolatedString {
    /// Parse `source`, failing on malformed template syntax
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let kind = if !is_templated(&source) {
            Kind::Literal
        } else {
            match single_expression(&source) {
                Some(inner) => {
                    ENVIRONMENT.compile_expression(inner)?;
                    Kind::Expression(inner.to_string())
                }
                None => {
                    ENVIRONMENT.template_from_str(&source)?;
                    Kind::Template
                }
            }
        };
        Ok(Self { source, kind })
    }

    /// Original text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if the text contains template markers
    pub fn is_templated(&self) -> bool {
        self.kind != Kind::Literal
    }

    /// Evaluate against `ctx`
    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        match &self.kind {
            Kind::Literal => Ok(Value::String(self.source.clone())),
            Kind::Expression(inner) => {
                let expr = ENVIRONMENT.compile_expression(inner)?;
                let result = expr
                    .eval(ctx)
                    .map_err(|e| template_error(&self.source, e))?;
                if result.is_undefined() {
                    return Err(Error::UndefinedVariable {
                        expression: self.source.clone(),
                    });
                }
                Ok(serde_json::to_value(&result)?)
            }
            Kind::Template => {
                let rendered = ENVIRONMENT
                    .render_str(&self.source, ctx)
                    .map_err(|e| template_error(&self.source, e))?;
                Ok(read_literal(rendered))
            }
        }
    }

    /// Evaluate against `ctx` and coerce to `expected`
    pub fn eval_as(&self, ctx: &Context, expected: ValueType) -> Result<Value> {
        coerce(self.eval(ctx)?, expected)
    }
}

/// A condition evaluated with Jinja-like truthiness
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolatedBoolean {
    /// Fixed outcome
    Literal(bool),
    /// Outcome depends on the context
    Expression(InterpolatedString),
}

impl InterpolatedBoolean {
    /// Parse a condition string
    pub fn new(condition: impl Into<String>) -> Result<Self> {
        Ok(Self::Expression(InterpolatedString::new(condition)?))
    }

    /// Evaluate the condition against `ctx`
    pub fn eval(&self, ctx: &Context) -> Result<bool> {
        match self {
            Self::Literal(b) => Ok(*b),
            Self::Expression(expr) => Ok(is_truthy(&expr.eval(ctx)?)),
        }
    }
}

impl From<bool> for InterpolatedBoolean {
    fn from(b: bool) -> Self {
        Self::Literal(b)
    }
}

const FALSE_STRINGS: &[&str] = &["", "false", "False", "None", "{}", "[]"];

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !FALSE_STRINGS.contains(&s.trim()),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Declared type an interpolated value must coerce to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Whole number
    Integer,
    /// Any number
    Number,
    /// `true` / `false`
    Boolean,
    /// Text
    String,
}

impl ValueType {
    fn name(self) -> &'static str {
        match self {
            ValueType::Integer => "int",
            ValueType::Number => "float",
            ValueType::Boolean => "bool",
            ValueType::String => "string",
        }
    }
}

/// Coerce `value` to `expected`.
///
/// Numeric strings coerce to numbers; anything else that does not already
/// have the declared type is a [`Error::TypeMismatch`].
pub fn coerce(value: Value, expected: ValueType) -> Result<Value> {
    let coerced = match (&value, expected) {
        (Value::Number(n), ValueType::Integer) if n.is_i64() || n.is_u64() => Some(value.clone()),
        (Value::String(s), ValueType::Integer) => s.trim().parse::<i64>().ok().map(Value::from),
        (Value::Number(_), ValueType::Number) => Some(value.clone()),
        (Value::String(s), ValueType::Number) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        (Value::Bool(_), ValueType::Boolean) => Some(value.clone()),
        (Value::String(s), ValueType::Boolean) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (Value::String(_), ValueType::String) => Some(value.clone()),
        (Value::Number(_) | Value::Bool(_), ValueType::String) => {
            Some(Value::String(value.to_string()))
        }
        _ => None,
    };

    coerced.ok_or_else(|| Error::TypeMismatch {
        value: match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        expected: expected.name(),
        found: type_name(&value),
    })
}

/// Evaluate a single value: strings are interpolated, everything else is
/// returned unchanged.
pub fn evaluate(value: &Value, ctx: &Context) -> Result<Value> {
    match value {
        Value::String(s) => InterpolatedString::new(s.as_str())?.eval(ctx),
        other => Ok(other.clone()),
    }
}

/// True if `text` contains a template marker
pub fn is_templated(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}

fn single_expression(source: &str) -> Option<&str> {
    let inner = SINGLE_EXPRESSION.captures(source)?.get(1)?.as_str();
    if inner.contains("{{") || inner.contains("}}") || inner.contains("{%") {
        return None;
    }
    Some(inner)
}

fn read_literal(rendered: String) -> Value {
    match serde_json::from_str::<Value>(rendered.trim()) {
        Ok(value) if !value.is_string() => value,
        _ => Value::String(rendered),
    }
}

fn template_error(source: &str, e: minijinja::Error) -> Error {
    if e.kind() == ErrorKind::UndefinedError {
        Error::UndefinedVariable {
            expression: source.to_string(),
        }
    } else {
        Error::Template(e)
    }
}
