//! Pagination strategies
//!
//! A strategy computes the token for the next page from what the previous
//! page returned. Strategies hold no mutable state, so calling
//! [`PaginationStrategy::next_page_token`] twice with the same arguments
//! always gives the same answer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result, type_name};
use crate::interpolation::{Context, ValueType, coerce, evaluate};

/// Computes successive page tokens
pub trait PaginationStrategy: Send + Sync {
    /// Token for the first request, or `None` to omit the page parameter
    fn initial_token(&self) -> Option<Value>;

    /// Token for the page after the one just read, or `None` when done
    fn next_page_token(
        &self,
        last_page_size: usize,
        last_record: Option<&Value>,
        last_page_token: Option<&Value>,
    ) -> Result<Option<Value>>;

    /// Configured page size, if any
    fn page_size(&self) -> Option<u64>;
}

/// `PageIncrement` definition as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageIncrementDefinition {
    /// Literal integer, numeric string, or templated expression
    #[serde(default)]
    pub page_size: Option<Value>,

    /// Number of the first page
    #[serde(default)]
    pub start_from_page: i64,

    /// Whether the first request carries `start_from_page`
    #[serde(default)]
    pub inject_on_first_request: bool,
}

/// Paginator definition as written in a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaginatorDefinition {
    /// Page-number pagination
    PageIncrement(PageIncrementDefinition),
}

impl PaginatorDefinition {
    /// Construct the strategy this definition describes
    pub fn build(
        &self,
        config: &Value,
        parameters: &Map<String, Value>,
    ) -> Result<Box<dyn PaginationStrategy>> {
        match self {
            Self::PageIncrement(definition) => {
                Ok(Box::new(PageIncrement::new(definition, config, parameters)?))
            }
        }
    }
}

/// Page-number pagination: 0, 1, 2, ... (or from `start_from_page`)
#[derive(Debug, Clone, PartialEq)]
pub struct PageIncrement {
    page_size: Option<u64>,
    start_from_page: i64,
    inject_on_first_request: bool,
}

impl PageIncrement {
    /// Build from a definition, resolving `page_size` once against `config`
    /// and `parameters`.
    pub fn new(
        definition: &PageIncrementDefinition,
        config: &Value,
        parameters: &Map<String, Value>,
    ) -> Result<Self> {
        let page_size = match &definition.page_size {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let ctx = Context::new(config.clone()).with_parameters(parameters)?;
                Some(resolve_page_size(raw, &ctx)?)
            }
        };

        Ok(Self {
            page_size,
            start_from_page: definition.start_from_page,
            inject_on_first_request: definition.inject_on_first_request,
        })
    }

    /// Number of the first page
    pub fn start_from_page(&self) -> i64 {
        self.start_from_page
    }
}

fn resolve_page_size(raw: &Value, ctx: &Context) -> Result<u64> {
    let value = coerce(evaluate(raw, ctx)?, ValueType::Integer)?;
    value
        .as_u64()
        .filter(|size| *size > 0)
        .ok_or_else(|| Error::config("PageIncrement", format!("page_size must be positive, got {}", value)))
}

impl PaginationStrategy for PageIncrement {
    fn initial_token(&self) -> Option<Value> {
        self.inject_on_first_request
            .then(|| Value::from(self.start_from_page))
    }

    fn next_page_token(
        &self,
        last_page_size: usize,
        last_record: Option<&Value>,
        last_page_token: Option<&Value>,
    ) -> Result<Option<Value>> {
        let partial_page = self
            .page_size
            .is_some_and(|size| (last_page_size as u64) < size);
        if partial_page || last_page_size == 0 || last_record.is_none() {
            tracing::debug!(last_page_size, page_size = ?self.page_size, "pagination finished");
            return Ok(None);
        }

        let current = match last_page_token {
            None | Some(Value::Null) => self.start_from_page,
            Some(token) => token.as_i64().ok_or_else(|| Error::TypeMismatch {
                value: token.to_string(),
                expected: "int",
                found: type_name(token),
            })?,
        };
        let next = current.checked_add(1).ok_or_else(|| {
            Error::config("PageIncrement", format!("page {} has no next page number", current))
        })?;
        Ok(Some(Value::from(next)))
    }

    fn page_size(&self) -> Option<u64> {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn strategy(page_size: Option<Value>, start_from_page: i64, inject: bool) -> Result<PageIncrement> {
        let definition = PageIncrementDefinition {
            page_size,
            start_from_page,
            inject_on_first_request: inject,
        };
        PageIncrement::new(&definition, &json!({"value": 2}), &Map::new())
    }

    #[rstest]
    #[case::same_page_size_start_from_1(Some(json!(2)), 1, 2, Some(json!({"id": 1})), Some(json!(3)), Some(json!(4)))]
    #[case::larger_page_size_start_from_1(Some(json!(3)), 1, 2, Some(json!({"id": 1})), Some(json!(3)), None)]
    #[case::same_page_size_start_from_0(Some(json!(2)), 0, 2, Some(json!({"id": 1})), Some(json!(3)), Some(json!(4)))]
    #[case::larger_page_size_start_from_0(Some(json!(3)), 0, 2, Some(json!({"id": 1})), Some(json!(3)), None)]
    #[case::no_page_size(None, 0, 0, None, Some(json!(2)), None)]
    #[case::page_size_from_string(Some(json!("2")), 0, 2, Some(json!({"id": 1})), Some(json!(3)), Some(json!(4)))]
    #[case::page_size_from_config(Some(json!("{{ config['value'] }}")), 0, 2, Some(json!({"id": 1})), Some(json!(3)), Some(json!(4)))]
    #[case::not_injected_returns_second_page(Some(json!(2)), 0, 2, Some(json!({"id": 1})), None, Some(json!(1)))]
    #[case::non_default_start_not_injected(Some(json!(2)), 10, 2, Some(json!({"id": 1})), None, Some(json!(11)))]
    fn test_next_page_token(
        #[case] page_size: Option<Value>,
        #[case] start_from_page: i64,
        #[case] last_page_size: usize,
        #[case] last_record: Option<Value>,
        #[case] last_page_token: Option<Value>,
        #[case] expected: Option<Value>,
    ) {
        let paginator = strategy(page_size, start_from_page, false).unwrap();
        assert_eq!(paginator.start_from_page(), start_from_page);

        let first = paginator
            .next_page_token(last_page_size, last_record.as_ref(), last_page_token.as_ref())
            .unwrap();
        assert_eq!(first, expected);

        // Stateless: the same call gives the same answer.
        let second = paginator
            .next_page_token(last_page_size, last_record.as_ref(), last_page_token.as_ref())
            .unwrap();
        assert_eq!(second, expected);
    }

    #[rstest]
    #[case(json!("{{ config['value'] }}"))]
    #[case(json!("not-an-integer"))]
    fn test_malformed_page_size_fails_fast(#[case] page_size: Value) {
        let definition = PageIncrementDefinition {
            page_size: Some(page_size),
            start_from_page: 0,
            inject_on_first_request: false,
        };
        let err = PageIncrement::new(&definition, &json!({"value": "not-an-integer"}), &Map::new())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("is of type string"), "{message}");
        assert!(message.contains("expected int"), "{message}");
    }

    #[test]
    fn test_non_positive_page_size_is_rejected() {
        assert!(strategy(Some(json!(0)), 0, false).is_err());
        assert!(strategy(Some(json!(-5)), 0, false).is_err());
    }

    #[rstest]
    #[case::inject_start_from_0(true, 0, Some(json!(0)))]
    #[case::inject_start_from_12(true, 12, Some(json!(12)))]
    #[case::without_inject(false, 2, None)]
    fn test_initial_token(#[case] inject: bool, #[case] start_from_page: i64, #[case] expected: Option<Value>) {
        let paginator = strategy(Some(json!(20)), start_from_page, inject).unwrap();
        assert_eq!(paginator.initial_token(), expected);
    }

    #[test]
    fn test_short_page_terminates_regardless_of_token() {
        let paginator = strategy(Some(json!(10)), 0, false).unwrap();
        for token in [None, Some(json!(1)), Some(json!(99))] {
            let next = paginator
                .next_page_token(9, Some(&json!({"id": 1})), token.as_ref())
                .unwrap();
            assert_eq!(next, None);
        }
    }

    #[test]
    fn test_non_integer_token_is_type_mismatch() {
        let paginator = strategy(Some(json!(2)), 0, false).unwrap();
        let err = paginator
            .next_page_token(2, Some(&json!({"id": 1})), Some(&json!("abc")))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { expected: "int", .. }));
    }

    #[rstest]
    #[case::token_at_max(0, Some(json!(i64::MAX)))]
    #[case::start_at_max(i64::MAX, None)]
    fn test_last_page_number_does_not_overflow(#[case] start_from_page: i64, #[case] token: Option<Value>) {
        let paginator = strategy(Some(json!(2)), start_from_page, false).unwrap();
        let result = paginator.next_page_token(2, Some(&json!({"id": 1})), token.as_ref());
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
    }

    #[test]
    fn test_build_from_tagged_definition() {
        let yaml = "type: PageIncrement\npage_size: \"{{ parameters.limit }}\"\ninject_on_first_request: true\n";
        let definition: PaginatorDefinition = serde_yaml::from_str(yaml).unwrap();
        let parameters = json!({"limit": 25}).as_object().cloned().unwrap();
        let paginator = definition.build(&json!({}), &parameters).unwrap();
        assert_eq!(paginator.page_size(), Some(25));
        assert_eq!(paginator.initial_token(), Some(json!(0)));
    }

    #[test]
    fn test_definition_defaults() {
        let definition: PageIncrementDefinition = serde_yaml::from_str("page_size: 50\n").unwrap();
        assert_eq!(definition.start_from_page, 0);
        assert!(!definition.inject_on_first_request);
    }
}
