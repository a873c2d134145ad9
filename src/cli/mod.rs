//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use colored::Colorize;
use tracing::warn;

use crate::commands::{Commands, RunArgs};
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::ReqwestTransport;
use crate::suite;
use crate::testing::report::{self, Summary};
use crate::testing::{catalog, TestScenario};

/// Overall result of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: Config) -> Result<Verdict> {
    match command {
        Commands::Run(args) => run(args, config).await,
        Commands::List { scenarios } => {
            let scenarios = load_scenarios(scenarios.as_deref())?;
            print_scenario_list(&scenarios);
            Ok(Verdict::Passed)
        }
    }
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(mut config: Config, args: &RunArgs) -> Result<Config> {
    if let Some(base_url) = &args.base_url {
        config.target.base_url = base_url.clone();
    }
    if let Some(jobs) = args.jobs {
        config.runner.jobs = jobs;
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: RunArgs, config: Config) -> Result<Verdict> {
    let config = apply_overrides(config, &args)?;
    let scenarios = catalog::filter(
        load_scenarios(args.scenarios.as_deref())?,
        args.filter.as_deref(),
    );

    if scenarios.is_empty() {
        let message = match &args.filter {
            Some(pattern) => format!("No scenarios match filter '{}'", pattern),
            None => "Scenario table is empty".to_string(),
        };
        warn!("{}", message);
        return Err(Error::Config(message));
    }

    let transport = ReqwestTransport::new(config.request_timeout())?;

    let json = args.json;
    let verbose = args.verbose;
    let outcomes = suite::run_suite(&transport, &config, &scenarios, |outcome| {
        if !json {
            report::print_outcome(outcome, verbose);
        }
    })
    .await?;

    let summary = Summary::from_outcomes(&outcomes);
    if json {
        println!("{}", report::to_json(&outcomes)?);
    } else {
        report::print_summary(&summary);
    }

    Ok(if summary.all_passed() {
        Verdict::Passed
    } else {
        Verdict::Failed
    })
}

fn load_scenarios(path: Option<&std::path::Path>) -> Result<Vec<TestScenario>> {
    match path {
        Some(path) => catalog::load(path),
        None => catalog::builtin(),
    }
}

fn print_scenario_list(scenarios: &[TestScenario]) {
    println!("Scenarios:");
    for scenario in scenarios {
        let auth = if scenario.requires_auth() {
            " [auth]".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} ({} step{}){}",
            scenario.name.white().bold(),
            scenario.steps.len(),
            if scenario.steps.len() == 1 { "" } else { "s" },
            auth
        );
        if let Some(desc) = &scenario.description {
            println!("      {}", desc.dimmed());
        }
    }
}
