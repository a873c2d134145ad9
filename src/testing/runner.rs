//! Scenario runner
//!
//! Executes scenarios against the service through an [`HttpTransport`],
//! matching every response against its step's expectation. Running is
//! separated from printing: each scenario yields a [`ScenarioOutcome`]
//! that the report module renders.

use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::common::config::Credentials;
use crate::common::{Error, Result};
use crate::http::{resolve_path, ApiRequest, ApiResponse, HttpTransport};
use crate::session::SessionContext;

use super::config::{AuthMode, RequestSpec, TestScenario, TestStep};
use super::matcher::{self, Mismatch};
use super::template::Variables;

/// Category of a scenario failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Response did not match the expectation
    Assertion,
    /// No response: connection, TLS or timeout problem
    Transport,
    /// Scenario could not be built (templating, missing token)
    Setup,
}

/// Why a scenario failed, with whatever the service sent back
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    /// 1-based step number
    pub step: usize,
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl Failure {
    fn from_error(step: usize, error: &Error) -> Self {
        let kind = match error {
            Error::Transport { .. } | Error::HttpClient(_) => FailureKind::Transport,
            _ => FailureKind::Setup,
        };
        Self {
            kind,
            step,
            message: error.to_string(),
            status: None,
            body: None,
        }
    }

    fn from_mismatch(step: usize, mismatch: &Mismatch, response: &ApiResponse) -> Self {
        Self {
            kind: FailureKind::Assertion,
            step,
            message: mismatch.to_string(),
            status: Some(response.status),
            body: Some(response.raw.clone()),
        }
    }
}

/// Record of one executed step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub label: String,
    pub passed: bool,
    /// Captured status, absent when no response arrived
    pub status: Option<u16>,
    #[serde(skip)]
    pub body: Option<String>,
}

impl StepRecord {
    /// A failed step that never got a response
    fn unanswered(label: String) -> Self {
        Self {
            label,
            passed: false,
            status: None,
            body: None,
        }
    }
}

/// Result of running one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub duration_ms: u64,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

/// Runs scenarios against one session
pub struct ScenarioRunner<'a> {
    transport: &'a dyn HttpTransport,
    session: &'a SessionContext,
    credentials: &'a Credentials,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(
        transport: &'a dyn HttpTransport,
        session: &'a SessionContext,
        credentials: &'a Credentials,
    ) -> Self {
        Self {
            transport,
            session,
            credentials,
        }
    }

    /// Run scenarios with at most `jobs` in flight.
    ///
    /// `on_done` sees each outcome as soon as it and every scenario before
    /// it have finished, so reports come out in table order.
    pub async fn run_all<F>(
        &self,
        scenarios: &[TestScenario],
        jobs: usize,
        mut on_done: F,
    ) -> Vec<ScenarioOutcome>
    where
        F: FnMut(&ScenarioOutcome),
    {
        let mut pending = stream::iter(scenarios.iter().map(move |s| self.run(s))).buffered(jobs.max(1));

        let mut outcomes = Vec::with_capacity(scenarios.len());
        while let Some(outcome) = pending.next().await {
            on_done(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Run every step of one scenario in order, stopping at the first failure
    pub async fn run(&self, scenario: &TestScenario) -> ScenarioOutcome {
        let started = Instant::now();
        let steps_total = scenario.steps.len();
        let mut records = Vec::with_capacity(steps_total);

        info!(scenario = %scenario.name, "Running scenario");

        let failure = match self.scenario_variables(scenario) {
            Err(e) => Some(Failure::from_error(1, &e)),
            Ok(vars) => {
                let mut failure = None;
                for (i, step) in scenario.steps.iter().enumerate() {
                    let step_num = i + 1;
                    let (record, step_failure) = self.run_step(step, step_num, &vars).await;
                    records.push(record);
                    if step_failure.is_some() {
                        failure = step_failure;
                        break;
                    }
                }
                failure
            }
        };

        if let Some(f) = &failure {
            warn!(scenario = %scenario.name, step = f.step, reason = %f.message, "Scenario failed");
        }

        ScenarioOutcome {
            name: scenario.name.clone(),
            description: scenario.description.clone(),
            passed: failure.is_none(),
            steps_run: records.len(),
            steps_total,
            duration_ms: started.elapsed().as_millis() as u64,
            steps: records,
            failure,
        }
    }

    fn scenario_variables(&self, scenario: &TestScenario) -> Result<Variables> {
        let mut vars = Variables::builtin(self.credentials);
        vars.extend_rendered(&scenario.vars)?;
        Ok(vars)
    }

    /// Execute one step: build, send, match
    async fn run_step(
        &self,
        step: &TestStep,
        step_num: usize,
        vars: &Variables,
    ) -> (StepRecord, Option<Failure>) {
        let label = step.label();

        let request = match build_request(&step.request, vars, self.session) {
            Ok(request) => request,
            Err(e) => {
                return (
                    StepRecord::unanswered(label),
                    Some(Failure::from_error(step_num, &e)),
                );
            }
        };

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                return (
                    StepRecord::unanswered(label),
                    Some(Failure::from_error(step_num, &e)),
                );
            }
        };

        debug!(step = %label, status = response.status, body = %response.raw, "Step response");

        let failure = matcher::evaluate(&step.expect, &response)
            .err()
            .map(|mismatch| Failure::from_mismatch(step_num, &mismatch, &response));

        let record = StepRecord {
            label,
            passed: failure.is_none(),
            status: Some(response.status),
            body: Some(response.raw),
        };
        (record, failure)
    }
}

/// Render a static request definition into a sendable request
pub fn build_request(
    spec: &RequestSpec,
    vars: &Variables,
    session: &SessionContext,
) -> Result<ApiRequest> {
    let path = vars.render(&spec.path)?;
    let params = vars.render_map(&spec.path_params)?;
    let url = resolve_path(session.base_url(), &path, &params)?;

    let mut request = ApiRequest::new(spec.method.into(), url);

    if spec.auth == AuthMode::Bearer {
        let token = session.require_token()?;
        request = request.header("Authorization", token.header_value());
    }

    for (name, value) in vars.render_map(&spec.headers)? {
        request = request.header(name, value);
    }

    if let Some(body) = &spec.body {
        request = request.json(vars.render_value(body)?);
    }

    Ok(request)
}
