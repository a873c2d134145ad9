//! Terminal and JSON reporting of scenario outcomes

use colored::Colorize;
use serde::Serialize;

use crate::common::{truncate_body, Result};

use super::runner::{FailureKind, ScenarioOutcome};

/// Body excerpt length in non-verbose failure output
const BODY_EXCERPT: usize = 500;

/// Aggregate counts for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[ScenarioOutcome]) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Print one scenario's steps and verdict
pub fn print_outcome(outcome: &ScenarioOutcome, verbose: bool) {
    println!(
        "\n{} {}",
        "Running Test:".blue().bold(),
        outcome.name.white().bold()
    );

    if let Some(desc) = &outcome.description {
        println!("  {}", desc.dimmed());
    }

    for (i, step) in outcome.steps.iter().enumerate() {
        let step_num = i + 1;
        let status = step
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "no response".to_string());

        if step.passed {
            println!(
                "  {} Step {}: {} ({})",
                "✓".green(),
                step_num,
                step.label.dimmed(),
                status.dimmed()
            );
        } else {
            println!("  {} Step {}: {} ({})", "✗".red(), step_num, step.label, status);
        }

        if verbose {
            if let Some(body) = step.body.as_deref().filter(|b| !b.is_empty()) {
                println!("      {}", body.dimmed());
            }
        }
    }

    match &outcome.failure {
        None => println!(
            "{} {} {}",
            "✓".green().bold(),
            "Test Passed".green().bold(),
            format!("({} ms)", outcome.duration_ms).dimmed()
        ),
        Some(failure) => {
            let kind = match failure.kind {
                FailureKind::Assertion => "assertion",
                FailureKind::Transport => "transport",
                FailureKind::Setup => "setup",
            };
            println!(
                "{} {} [{}] step {}: {}",
                "✗".red().bold(),
                "Test Failed".red().bold(),
                kind,
                failure.step,
                failure.message
            );
            if let Some(status) = failure.status {
                println!("    status: {}", status);
            }
            if let Some(body) = &failure.body {
                let shown = if verbose {
                    body.clone()
                } else {
                    truncate_body(body, BODY_EXCERPT)
                };
                println!("    body:   {}", shown);
            }
        }
    }
}

/// Print the closing summary line
pub fn print_summary(summary: &Summary) {
    let line = format!(
        "{} scenarios: {} passed, {} failed",
        summary.total, summary.passed, summary.failed
    );
    if summary.all_passed() {
        println!("\n{}", line.green().bold());
    } else {
        println!("\n{}", line.red().bold());
    }
}

/// JSON document printed by `--json`
#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    scenarios: &'a [ScenarioOutcome],
}

/// Render outcomes as a JSON report
pub fn to_json(outcomes: &[ScenarioOutcome]) -> Result<String> {
    let report = JsonReport {
        summary: Summary::from_outcomes(outcomes),
        scenarios: outcomes,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
