//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenario tables.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::common::{Error, Result};

use super::matcher::{BodyMatcher, Matcher};

/// A YAML document holding a table of scenarios
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub scenarios: Vec<TestScenario>,
}

impl ScenarioFile {
    /// Check the table for mistakes serde cannot catch
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate scenario name '{}'",
                    scenario.name
                )));
            }
            scenario.validate()?;
        }
        Ok(())
    }
}

/// One independent test case
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TestScenario {
    /// Human-readable name, used in reports and for filtering
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Scenario-local variables, rendered once and shared by every step.
    /// Values may reference built-in variables such as `${timestamp}`.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// Requests executed in order; the first failure stops the scenario
    pub steps: Vec<TestStep>,
}

impl TestScenario {
    /// Whether any step needs the session's bearer token
    pub fn requires_auth(&self) -> bool {
        self.steps.iter().any(|s| s.request.auth == AuthMode::Bearer)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("Scenario name must not be empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(Error::Config(format!(
                "Scenario '{}' has no steps",
                self.name
            )));
        }
        for (i, step) in self.steps.iter().enumerate() {
            for assertion in &step.expect.body {
                if assertion.matchers().is_empty() {
                    return Err(Error::Config(format!(
                        "Scenario '{}' step {}: assertion on '{}' has no check",
                        self.name,
                        i + 1,
                        assertion.path
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A single request/expectation pair
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TestStep {
    /// Optional label for reports (defaults to "METHOD path")
    pub name: Option<String>,
    pub request: RequestSpec,
    pub expect: Expectation,
}

impl TestStep {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.request.method, self.request.path))
    }
}

/// Static request definition
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Path relative to the base URL; `{name}` segments are path parameters
    pub path: String,
    #[serde(default)]
    pub path_params: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body; string leaves may contain `${var}` placeholders
    pub body: Option<Value>,
    /// Whether to send the session's bearer token
    #[serde(default)]
    pub auth: AuthMode,
}

/// How a request is authorized
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No Authorization header
    #[default]
    None,
    /// `Authorization: Bearer <session token>`
    Bearer,
}

/// HTTP methods the scenarios use
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(reqwest::Method::from(*self).as_str())
    }
}

/// Expected outcome of a step
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Expectation {
    /// Exact status code
    pub status: u16,
    /// Body assertions, checked in order after the status
    #[serde(default)]
    pub body: Vec<BodyAssertion>,
}

impl Expectation {
    /// Flatten the assertions into ordered matchers
    pub fn body_matchers(&self) -> Vec<BodyMatcher> {
        self.body
            .iter()
            .flat_map(|a| {
                a.matchers().into_iter().map(|matcher| BodyMatcher {
                    path: a.path.clone(),
                    matcher,
                })
            })
            .collect()
    }
}

/// Assertion on one body field
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BodyAssertion {
    /// Dot-separated field path (`books.0.isbn`); empty for the whole body
    #[serde(default)]
    pub path: String,
    /// Expected value (exact match)
    pub equals: Option<Value>,
    /// Expected substring of a string field
    pub contains: Option<String>,
    /// Require a non-empty array, object or string
    pub not_empty: Option<bool>,
    /// Require the field to be missing, null or empty
    pub empty: Option<bool>,
}

impl BodyAssertion {
    /// Checks in the order they are applied
    pub fn matchers(&self) -> Vec<Matcher> {
        let mut matchers = Vec::new();
        if let Some(expected) = &self.equals {
            matchers.push(Matcher::Equals(expected.clone()));
        }
        if let Some(substr) = &self.contains {
            matchers.push(Matcher::Contains(substr.clone()));
        }
        if self.not_empty == Some(true) {
            matchers.push(Matcher::NotEmpty);
        }
        if self.empty == Some(true) {
            matchers.push(Matcher::Empty);
        }
        matchers
    }
}
