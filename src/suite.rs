//! Suite orchestration: authenticate once, then run the scenario table

use reqwest::Url;
use tracing::info;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::HttpTransport;
use crate::session::{Authenticator, SessionContext};
use crate::testing::{ScenarioOutcome, ScenarioRunner, TestScenario};

/// Build the session the scenarios will share.
///
/// Logs in only when some scenario needs the token. A failed login is a
/// fatal [`Error::Authentication`].
pub async fn prepare_session(
    transport: &dyn HttpTransport,
    config: &Config,
    scenarios: &[TestScenario],
) -> Result<SessionContext> {
    let base_url = Url::parse(&config.target.base_url).map_err(|e| {
        Error::Config(format!("Invalid base_url '{}': {}", config.target.base_url, e))
    })?;

    if scenarios.iter().any(TestScenario::requires_auth) {
        Authenticator::new(transport, base_url)
            .login(&config.credentials)
            .await
    } else {
        info!("No selected scenario needs a token; skipping login");
        Ok(SessionContext::anonymous(base_url))
    }
}

/// Run `scenarios` against the configured service.
///
/// Setup failures are returned as errors; scenario failures are reported
/// through the outcomes and never abort the remaining scenarios.
pub async fn run_suite<F>(
    transport: &dyn HttpTransport,
    config: &Config,
    scenarios: &[TestScenario],
    on_done: F,
) -> Result<Vec<ScenarioOutcome>>
where
    F: FnMut(&ScenarioOutcome),
{
    let session = prepare_session(transport, config, scenarios).await?;

    info!(
        scenarios = scenarios.len(),
        jobs = config.runner.jobs,
        base_url = %session.base_url(),
        "Starting suite"
    );

    let runner = ScenarioRunner::new(transport, &session, &config.credentials);
    Ok(runner.run_all(scenarios, config.runner.jobs, on_done).await)
}
