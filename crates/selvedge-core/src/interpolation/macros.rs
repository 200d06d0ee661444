//! Helper functions available inside expressions
//!
//! Only pure functions are registered: evaluating the same expression twice
//! against the same context always gives the same result.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind};
use std::cmp::Ordering;
use std::fmt::Write;

pub(super) fn register(env: &mut Environment<'static>) {
    env.add_function("max", max);
    env.add_function("min", min);
    env.add_function("str_to_datetime", str_to_datetime);
    env.add_function("format_datetime", format_datetime);
    env.add_function("timestamp", timestamp);
}

fn max(args: Rest<Value>) -> Value {
    args.iter()
        .cloned()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .unwrap_or_default()
}

fn min(args: Rest<Value>) -> Value {
    args.iter()
        .cloned()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .unwrap_or_default()
}

/// Normalize a date or datetime string to RFC 3339 in UTC
fn str_to_datetime(input: String) -> Result<String, Error> {
    Ok(parse_datetime(&input)?.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Format a date, datetime, or epoch seconds with a strftime pattern
fn format_datetime(input: Value, format: String) -> Result<String, Error> {
    let dt = to_datetime(&input)?;
    let mut out = String::new();
    write!(out, "{}", dt.format(&format))
        .map_err(|_| invalid(format!("invalid datetime format '{}'", format)))?;
    Ok(out)
}

/// Epoch seconds of a date, datetime, or number
fn timestamp(input: Value) -> Result<i64, Error> {
    Ok(to_datetime(&input)?.timestamp())
}

fn to_datetime(input: &Value) -> Result<DateTime<Utc>, Error> {
    if let Some(text) = input.as_str() {
        return parse_datetime(text);
    }
    i64::try_from(input.clone())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| invalid(format!("cannot interpret {} as a datetime", input)))
}

fn parse_datetime(input: &str) -> Result<DateTime<Utc>, Error> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| invalid(format!("cannot parse '{}' as a datetime", input)))
}

fn invalid(message: String) -> Error {
    Error::new(ErrorKind::InvalidOperation, message)
}
