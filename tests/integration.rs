//! End-to-end tests for the check suite
//!
//! These tests run the real runner and reqwest transport against a local
//! mockito server that imitates the demo service, so no network access
//! is needed:
//! 1. Login and session setup
//! 2. The built-in scenario table against a well-behaved service
//! 3. Failure reporting (assertion, transport, fatal setup)
//! 4. The binary itself: report output and exit codes

use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

use bookstore_checks::common::config::Config;
use bookstore_checks::http::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use bookstore_checks::suite::{prepare_session, run_suite};
use bookstore_checks::testing::{catalog, FailureKind, ScenarioOutcome, TestScenario};
use bookstore_checks::{Authenticator, Error};

const TOKEN: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9.test";

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(5)).expect("Failed to build transport")
}

fn config_for(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.target.base_url = server.url();
    config
}

fn parse(yaml: &str) -> Vec<TestScenario> {
    catalog::parse(yaml).expect("Invalid scenario table")
}

fn find<'a>(outcomes: &'a [ScenarioOutcome], name: &str) -> &'a ScenarioOutcome {
    outcomes
        .iter()
        .find(|o| o.name == name)
        .unwrap_or_else(|| panic!("No outcome for '{}'", name))
}

/// Register the token endpoint for the default demo account, expected `hits` times
async fn mock_login(server: &mut ServerGuard, hits: usize) -> mockito::Mock {
    server
        .mock("POST", "/Account/v1/GenerateToken")
        .match_body(Matcher::Json(json!({
            "userName": "w2e3r4t51982",
            "password": "POiu1234!"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "token": TOKEN,
                "expires": "2026-10-26T12:00:00.000Z",
                "status": "Success",
                "result": "User authorized successfully."
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

/// Register every endpoint the built-in suite touches, behaving like the demo service
async fn mock_demo_service(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let bearer = format!("Bearer {}", TOKEN);
    // Once for suite setup, once for the successful-login scenario
    let mut mocks = vec![mock_login(server, 2).await];

    mocks.push(
        server
            .mock("POST", "/Account/v1/GenerateToken")
            .match_body(Matcher::PartialJson(json!({"password": "1234567"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "token": null,
                    "expires": null,
                    "status": "Failed",
                    "result": "User authorization failed."
                })
                .to_string(),
            )
            .create_async()
            .await,
    );

    mocks.push(
        server
            .mock("GET", "/Account/v1/User/wert")
            .match_header("authorization", bearer.as_str())
            .with_status(401)
            .with_body(json!({"code": "1207", "message": "User not found!"}).to_string())
            .create_async()
            .await,
    );

    mocks.push(
        server
            .mock("POST", "/Account/v1/User")
            .match_body(Matcher::PartialJson(json!({"userName": ""})))
            .with_status(400)
            .with_body(
                json!({"code": "1200", "message": "UserName and Password required."}).to_string(),
            )
            .create_async()
            .await,
    );

    mocks.push(
        server
            .mock("POST", "/Account/v1/User")
            .match_body(Matcher::Regex(r#""userName":"tempUser_\d+""#.to_string()))
            .with_status(201)
            .with_body(json!({"userID": "0f1e", "username": "tempUser", "books": []}).to_string())
            .create_async()
            .await,
    );

    mocks.push(
        server
            .mock("DELETE", "/Account/v1/User/userDoesNotExist")
            .match_header("authorization", bearer.as_str())
            .with_status(200)
            .with_body(json!({"code": "1207", "message": "User Id not correct!"}).to_string())
            .create_async()
            .await,
    );

    mocks.push(
        server
            .mock(
                "DELETE",
                Matcher::Regex(r"^/Account/v1/User/tempUser_\d+$".to_string()),
            )
            .match_header("authorization", bearer.as_str())
            .with_status(204)
            .create_async()
            .await,
    );

    mocks.push(
        server
            .mock("GET", "/BookStore/v1/Books")
            .with_status(200)
            .with_body(
                json!({"books": [{"isbn": "9781449325862", "title": "Git Pocket Guide"}]})
                    .to_string(),
            )
            .create_async()
            .await,
    );

    mocks.push(
        server
            .mock("DELETE", "/BookStore/v1/Book")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({
                "isbn": "9781593277574",
                "userId": "w2e3r4t51982"
            })))
            .with_status(401)
            .with_body(json!({"code": "1200", "message": "User not authorized!"}).to_string())
            .create_async()
            .await,
    );

    mocks
}

// ============== Login ==============

#[tokio::test]
async fn test_login_populates_session() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, 1).await;
    let config = config_for(&server);
    let transport = transport();

    let base = reqwest::Url::parse(&server.url()).unwrap();
    let session = Authenticator::new(&transport, base)
        .login(&config.credentials)
        .await
        .expect("Login should succeed");

    assert!(session.is_authenticated());
    assert_eq!(session.token().unwrap().as_str(), TOKEN);
    login.assert_async().await;
}

#[tokio::test]
async fn test_login_rejected_is_fatal() {
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/Account/v1/GenerateToken")
        .with_status(200)
        .with_body(
            json!({
                "token": null,
                "expires": null,
                "status": "Failed",
                "result": "User authorization failed."
            })
            .to_string(),
        )
        .create_async()
        .await;
    let books = server
        .mock("GET", "/BookStore/v1/Books")
        .expect(0)
        .create_async()
        .await;

    let config = config_for(&server);
    let scenarios = catalog::builtin().unwrap();

    let result = run_suite(&transport(), &config, &scenarios, |_| {}).await;

    assert!(matches!(result, Err(Error::Authentication(_))));
    books.assert_async().await;
}

#[tokio::test]
async fn test_login_without_token_is_fatal() {
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/Account/v1/GenerateToken")
        .with_status(200)
        .with_body(
            json!({
                "token": "",
                "status": "Success",
                "result": "User authorized successfully."
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = config_for(&server);
    let base = reqwest::Url::parse(&server.url()).unwrap();
    let result = Authenticator::new(&transport(), base)
        .login(&config.credentials)
        .await;

    assert!(matches!(result, Err(Error::Authentication(_))));
}

#[tokio::test]
async fn test_anonymous_selection_skips_login() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/Account/v1/GenerateToken")
        .expect(0)
        .create_async()
        .await;

    let config = config_for(&server);
    let scenarios = catalog::filter(catalog::builtin().unwrap(), Some("list books"));
    assert_eq!(scenarios.len(), 1);

    let session = prepare_session(&transport(), &config, &scenarios)
        .await
        .unwrap();

    assert!(!session.is_authenticated());
    login.assert_async().await;
}

// ============== Built-in suite ==============

#[tokio::test]
async fn test_builtin_suite_passes_against_demo_service() {
    let mut server = Server::new_async().await;
    let mocks = mock_demo_service(&mut server).await;

    let mut config = config_for(&server);
    config.runner.jobs = 4;
    let scenarios = catalog::builtin().unwrap();

    let mut reported = Vec::new();
    let outcomes = run_suite(&transport(), &config, &scenarios, |o| {
        reported.push(o.name.clone())
    })
    .await
    .expect("Suite setup should succeed");

    for outcome in &outcomes {
        assert!(
            outcome.passed,
            "Scenario '{}' failed: {:?}",
            outcome.name, outcome.failure
        );
        assert_eq!(outcome.steps_run, outcome.steps_total);
    }

    // Reported in table order even with several jobs
    let expected: Vec<String> = scenarios.iter().map(|s| s.name.clone()).collect();
    assert_eq!(reported, expected);

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_failures_are_reported_per_scenario() {
    let mut server = Server::new_async().await;
    let _books = server
        .mock("GET", "/BookStore/v1/Books")
        .with_status(200)
        .with_body(json!({"books": []}).to_string())
        .create_async()
        .await;
    let _create_user = server
        .mock("POST", "/Account/v1/User")
        .with_status(400)
        .with_body(json!({"message": "UserName and Password required."}).to_string())
        .create_async()
        .await;

    let config = config_for(&server);
    let scenarios = parse(
        r#"
scenarios:
  - name: books
    steps:
      - request: { method: GET, path: /BookStore/v1/Books }
        expect:
          status: 200
          body:
            - path: books
              not_empty: true
  - name: empty username
    steps:
      - request:
          method: POST
          path: /Account/v1/User
          body: { userName: "", password: "Test123!" }
        expect:
          status: 400
          body:
            - path: message
              contains: UserName and Password required
"#,
    );

    let outcomes = run_suite(&transport(), &config, &scenarios, |_| {})
        .await
        .unwrap();

    let books = find(&outcomes, "books");
    assert!(!books.passed);
    let failure = books.failure.as_ref().unwrap();
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert_eq!(failure.status, Some(200));
    assert!(failure.message.contains("books"));
    assert!(failure.body.as_deref().unwrap().contains("\"books\""));

    assert!(find(&outcomes, "empty username").passed);
}

#[tokio::test]
async fn test_status_mismatch_stops_lifecycle() {
    let mut server = Server::new_async().await;
    let _login = mock_login(&mut server, 1).await;
    let _create_user = server
        .mock("POST", "/Account/v1/User")
        .with_status(406)
        .with_body(json!({"code": "1204", "message": "User exists!"}).to_string())
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let config = config_for(&server);
    let scenarios = catalog::filter(catalog::builtin().unwrap(), Some("temporary user"));

    let outcomes = run_suite(&transport(), &config, &scenarios, |_| {})
        .await
        .unwrap();

    let outcome = &outcomes[0];
    assert!(!outcome.passed);
    assert_eq!(outcome.steps_run, 1);
    assert_eq!(outcome.steps_total, 2);
    let failure = outcome.failure.as_ref().unwrap();
    assert_eq!(failure.step, 1);
    assert_eq!(failure.status, Some(406));
    assert!(failure.message.contains("Expected status 201, got 406"));
    delete.assert_async().await;
}

#[tokio::test]
async fn test_transport_failure_is_reported_not_retried() {
    let mut config = Config::default();
    // Nothing listens on port 1
    config.target.base_url = "http://127.0.0.1:1".to_string();
    let scenarios = catalog::filter(catalog::builtin().unwrap(), Some("list books"));

    let outcomes = run_suite(&transport(), &config, &scenarios, |_| {})
        .await
        .unwrap();

    let failure = outcomes[0].failure.as_ref().expect("Scenario should fail");
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.status, None);
    assert_eq!(outcomes[0].steps[0].status, None);
}

// ============== Scenario isolation ==============

/// Transport that records requests and answers from a script
struct ScriptedTransport {
    seen: Mutex<Vec<ApiRequest>>,
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> bookstore_checks::Result<ApiResponse> {
        let status = match (request.method.as_str(), request.url.path()) {
            ("POST", "/Account/v1/GenerateToken") => 200,
            ("POST", _) => 201,
            ("DELETE", _) => 204,
            _ => 404,
        };
        let body = if status == 200 {
            json!({
                "token": TOKEN,
                "status": "Success",
                "result": "User authorized successfully."
            })
            .to_string()
        } else {
            String::new()
        };
        self.seen.lock().unwrap().push(request);
        Ok(ApiResponse::new(status, body))
    }
}

#[tokio::test]
async fn test_lifecycle_deletes_the_user_it_created() {
    let transport = ScriptedTransport {
        seen: Mutex::new(Vec::new()),
    };
    let config = Config::default();
    let scenarios = catalog::filter(catalog::builtin().unwrap(), Some("temporary user"));

    // Run twice: generated names must differ between runs
    let first = run_suite(&transport, &config, &scenarios, |_| {}).await.unwrap();
    let second = run_suite(&transport, &config, &scenarios, |_| {}).await.unwrap();
    assert!(first[0].passed && second[0].passed);

    let seen = transport.seen.lock().unwrap();
    let created: Vec<String> = seen
        .iter()
        .filter(|r| r.url.path() == "/Account/v1/User")
        .map(|r| r.body.as_ref().unwrap()["userName"].as_str().unwrap().to_string())
        .collect();
    let deleted: Vec<String> = seen
        .iter()
        .filter(|r| r.method == reqwest::Method::DELETE)
        .map(|r| r.url.path().rsplit('/').next().unwrap().to_string())
        .collect();

    assert_eq!(created.len(), 2);
    assert_eq!(created, deleted);
    assert_ne!(created[0], created[1]);
    assert!(created.iter().all(|name| name.starts_with("tempUser_")));

    // Login happened before the authenticated delete in each run
    let first_login = seen
        .iter()
        .position(|r| r.url.path() == "/Account/v1/GenerateToken")
        .unwrap();
    let first_delete = seen
        .iter()
        .position(|r| r.method == reqwest::Method::DELETE)
        .unwrap();
    assert!(first_login < first_delete);
    assert!(seen
        .iter()
        .filter(|r| r.method == reqwest::Method::DELETE)
        .all(|r| r
            .headers
            .contains(&("Authorization".to_string(), format!("Bearer {}", TOKEN)))));
}

// ============== Configuration ==============

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[target]
base_url = "http://localhost:5000"

[credentials]
username = "tester"
password = "pw"

[timeouts]
request_secs = 5
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.target.base_url, "http://localhost:5000");
    assert_eq!(config.credentials.username, "tester");
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.runner.jobs, 1);
}

#[test]
fn test_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = Config::load_from(&dir.path().join("absent.toml"));
    assert!(matches!(missing, Err(Error::FileRead { .. })));

    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[runner]\njobs = \"many\"\n").unwrap();
    assert!(matches!(Config::load_from(&path), Err(Error::ConfigParse(_))));
}

// ============== Binary ==============

/// Output from one CLI invocation
struct CliOutput {
    stdout: String,
    stderr: String,
    code: Option<i32>,
}

/// Run `bookstore-checks run ...` against `base_url` with a config file in `dir`
fn run_cli(dir: &Path, base_url: &str, args: &[&str]) -> CliOutput {
    let config = dir.join("config.toml");
    std::fs::write(&config, "[timeouts]\nrequest_secs = 5\n").expect("Failed to write config");

    let output = Command::new(env!("CARGO_BIN_EXE_bookstore-checks"))
        .arg("--config")
        .arg(&config)
        .arg("run")
        .args(["--base-url", base_url])
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run bookstore-checks");

    CliOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code(),
    }
}

fn mock_books(server: &mut ServerGuard, books: serde_json::Value) -> mockito::Mock {
    server
        .mock("GET", "/BookStore/v1/Books")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "books": books }).to_string())
        .create()
}

#[test]
fn test_cli_exits_zero_when_all_pass() {
    let mut server = Server::new();
    let _books = mock_books(&mut server, json!([{"isbn": "9781449325862"}]));
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(dir.path(), &server.url(), &["--filter", "list books"]);

    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);
    assert!(output.stdout.contains("Running Test: List books"));
    assert!(output.stdout.contains("✓ Test Passed"));
    assert!(output.stdout.contains("1 scenarios: 1 passed, 0 failed"));
}

#[test]
fn test_cli_exits_one_on_assertion_failure() {
    let mut server = Server::new();
    let _books = mock_books(&mut server, json!([]));
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(dir.path(), &server.url(), &["--filter", "list books"]);

    assert_eq!(output.code, Some(1), "stderr: {}", output.stderr);
    assert!(output.stdout.contains("List books"));
    assert!(output.stdout.contains("✗ Test Failed [assertion] step 1"));
    assert!(output.stdout.contains("status: 200"));
    assert!(output.stdout.contains("1 scenarios: 0 passed, 1 failed"));
}

#[test]
fn test_cli_exits_two_when_login_rejected() {
    let mut server = Server::new();
    let _login = server
        .mock("POST", "/Account/v1/GenerateToken")
        .with_status(200)
        .with_body(
            json!({
                "token": null,
                "expires": null,
                "status": "Failed",
                "result": "User authorization failed."
            })
            .to_string(),
        )
        .create();
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(dir.path(), &server.url(), &[]);

    assert_eq!(output.code, Some(2));
    assert!(output.stderr.contains("Error: Authentication failed"));
    assert!(!output.stdout.contains("Running Test:"));
}

#[test]
fn test_cli_unmatched_filter_exits_two() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(dir.path(), "http://127.0.0.1:1", &["--filter", "nosuchthing"]);

    assert_eq!(output.code, Some(2));
    assert!(output.stderr.contains("No scenarios match filter 'nosuchthing'"));
}

#[test]
fn test_cli_json_report() {
    let mut server = Server::new();
    let _books = mock_books(&mut server, json!([{"isbn": "9781449325862"}]));
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(dir.path(), &server.url(), &["--filter", "list books", "--json"]);

    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);
    let report: serde_json::Value =
        serde_json::from_str(&output.stdout).expect("stdout should be a JSON report");
    assert_eq!(report["summary"]["passed"], 1);
    assert_eq!(report["scenarios"][0]["name"], "List books");
}

#[test]
fn test_cli_log_file_captures_responses() {
    let mut server = Server::new();
    let _books = mock_books(&mut server, json!([{"isbn": "9781449325862"}]));
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("run.log");

    let output = run_cli(
        dir.path(),
        &server.url(),
        &["--filter", "list books", "--log-file", log_path.to_str().unwrap()],
    );

    assert_eq!(output.code, Some(0), "stderr: {}", output.stderr);
    let log = std::fs::read_to_string(&log_path).expect("Log file should exist");
    assert!(log.contains("Received response"));
    assert!(log.contains("9781449325862"));
}
