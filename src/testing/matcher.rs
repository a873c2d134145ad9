//! Expectation matching
//!
//! Pure comparison of a captured response against a step's expectation.
//! The status code is checked first, then body matchers in order; the
//! first failure is the reported reason.

use std::fmt;

use serde_json::Value;

use crate::common::truncate_body;
use crate::http::ApiResponse;

use super::config::Expectation;

/// Predicate on one body field
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Field equals this JSON value
    Equals(Value),
    /// Field is a string containing this substring
    Contains(String),
    /// Field is a non-empty array, object or string
    NotEmpty,
    /// Field is missing, null, or an empty array, object or string
    Empty,
}

/// A matcher bound to the field it inspects
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMatcher {
    pub path: String,
    pub matcher: Matcher,
}

/// Why a response did not meet its expectation
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    Status { expected: u16, actual: u16 },
    Body { path: String, reason: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Status { expected, actual } => {
                write!(f, "Expected status {}, got {}", expected, actual)
            }
            Mismatch::Body { path, reason } => {
                let field = if path.is_empty() { "<body>" } else { path };
                write!(f, "Field '{}': {}", field, reason)
            }
        }
    }
}

/// Navigate a body by dot-separated path. Numeric segments index arrays.
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(body);
    }
    path.split('.').try_fold(body, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

impl Matcher {
    /// Apply to a looked-up field (`None` when the path does not exist)
    pub fn check(&self, actual: Option<&Value>) -> std::result::Result<(), String> {
        match self {
            Matcher::Equals(expected) => match actual {
                Some(value) if value == expected => Ok(()),
                Some(value) => Err(format!("expected {}, got {}", expected, describe(value))),
                None => Err(format!("expected {}, but field is missing", expected)),
            },
            Matcher::Contains(substr) => match actual {
                Some(Value::String(s)) if s.contains(substr.as_str()) => Ok(()),
                Some(Value::String(s)) => {
                    Err(format!("expected string containing '{}', got '{}'", substr, s))
                }
                Some(value) => Err(format!(
                    "expected string containing '{}', got {}",
                    substr,
                    describe(value)
                )),
                None => Err(format!(
                    "expected string containing '{}', but field is missing",
                    substr
                )),
            },
            Matcher::NotEmpty => match actual {
                Some(value) if is_non_empty(value) => Ok(()),
                Some(value) => Err(format!("expected non-empty value, got {}", describe(value))),
                None => Err("expected non-empty value, but field is missing".to_string()),
            },
            Matcher::Empty => match actual {
                None | Some(Value::Null) => Ok(()),
                Some(value) if !is_non_empty(value) && !is_scalar(value) => Ok(()),
                Some(value) => Err(format!("expected empty or missing, got {}", describe(value))),
            },
        }
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => false,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_))
}

fn describe(value: &Value) -> String {
    truncate_body(&value.to_string(), 120)
}

/// Check a response against an expectation
pub fn evaluate(expect: &Expectation, response: &ApiResponse) -> std::result::Result<(), Mismatch> {
    if expect.status != response.status {
        return Err(Mismatch::Status {
            expected: expect.status,
            actual: response.status,
        });
    }

    for BodyMatcher { path, matcher } in expect.body_matchers() {
        matcher
            .check(lookup(&response.body, &path))
            .map_err(|reason| Mismatch::Body { path, reason })?;
    }

    Ok(())
}
