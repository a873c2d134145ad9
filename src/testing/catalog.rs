//! Scenario tables: the built-in suite and user-supplied YAML files

use std::path::Path;

use crate::common::{Error, Result};

use super::config::{ScenarioFile, TestScenario};

/// The account and bookstore suite shipped with the binary
const BUILTIN_SCENARIOS: &str = include_str!("../../scenarios/demoqa.yaml");

/// Load the built-in scenario table
pub fn builtin() -> Result<Vec<TestScenario>> {
    parse(BUILTIN_SCENARIOS)
}

/// Load a scenario table from a YAML file
pub fn load(path: &Path) -> Result<Vec<TestScenario>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read test scenario '{}': {}",
            path.display(),
            e
        ))
    })?;
    parse(&content)
}

/// Parse and validate a scenario table
pub fn parse(yaml: &str) -> Result<Vec<TestScenario>> {
    let file: ScenarioFile = serde_yaml::from_str(yaml)
        .map_err(|e| Error::Config(format!("Failed to parse test scenario: {}", e)))?;
    file.validate()?;
    Ok(file.scenarios)
}

/// Keep scenarios whose name contains `pattern`, ignoring case
pub fn filter(scenarios: Vec<TestScenario>, pattern: Option<&str>) -> Vec<TestScenario> {
    match pattern {
        None => scenarios,
        Some(pattern) => {
            let needle = pattern.to_lowercase();
            scenarios
                .into_iter()
                .filter(|s| s.name.to_lowercase().contains(&needle))
                .collect()
        }
    }
}
