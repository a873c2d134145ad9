//! Session context and the one-time login exchange
//!
//! The session is built once before any scenario runs and is then only
//! shared by reference. There is no ambient token: scenarios that need
//! authorization read it from the [`SessionContext`] they were handed.

use std::fmt;

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::config::Credentials;
use crate::common::{Error, Result};
use crate::http::{resolve_path, ApiRequest, HttpTransport};

/// Endpoint that exchanges credentials for a bearer token
pub const GENERATE_TOKEN_PATH: &str = "/Account/v1/GenerateToken";

/// `status` value of a successful login
const STATUS_SUCCESS: &str = "Success";

/// `result` value of a successful login
const RESULT_AUTHORIZED: &str = "User authorized successfully.";

/// Opaque credential for the `Authorization` header. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a token, rejecting empty or whitespace-only values
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Keep tokens out of logs and panic messages
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(<{} chars>)", self.0.len())
    }
}

/// Read-only context shared by every scenario in a run
#[derive(Debug, Clone)]
pub struct SessionContext {
    base_url: Url,
    token: Option<BearerToken>,
}

impl SessionContext {
    /// A session with no token; only anonymous scenarios can use it
    pub fn anonymous(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    /// A session carrying a token obtained from a successful login
    pub fn authenticated(base_url: Url, token: BearerToken) -> Self {
        Self {
            base_url,
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The token, or an error for scenarios that cannot run without one
    pub fn require_token(&self) -> Result<&BearerToken> {
        self.token.as_ref().ok_or(Error::NotAuthenticated)
    }
}

/// Login request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
}

/// Login response body. Fields are optional because the failure shape
/// omits the token.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub status: Option<String>,
    pub result: Option<String>,
    pub token: Option<String>,
    pub expires: Option<String>,
}

/// Performs the single login exchange that populates the session
pub struct Authenticator<'a> {
    transport: &'a dyn HttpTransport,
    base_url: Url,
}

impl<'a> Authenticator<'a> {
    pub fn new(transport: &'a dyn HttpTransport, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    /// Log in and build an authenticated session.
    ///
    /// Any deviation from the success shape is an [`Error::Authentication`];
    /// the caller treats it as fatal for the run. No retries.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionContext> {
        let url = resolve_path(&self.base_url, GENERATE_TOKEN_PATH, &Default::default())?;
        let body = serde_json::to_value(LoginRequest {
            user_name: &credentials.username,
            password: &credentials.password,
        })?;

        info!(user = %credentials.username, "Requesting bearer token");

        let response = self
            .transport
            .execute(ApiRequest::new(Method::POST, url).json(body))
            .await
            .map_err(|e| Error::Authentication(e.to_string()))?;

        if response.status != 200 {
            return Err(Error::Authentication(format!(
                "Expected HTTP 200 from {}, got {}: {}",
                GENERATE_TOKEN_PATH, response.status, response.raw
            )));
        }

        let login: LoginResponse = serde_json::from_value(response.body.clone()).map_err(|e| {
            Error::Authentication(format!("Unexpected login response '{}': {}", response.raw, e))
        })?;

        if login.status.as_deref() != Some(STATUS_SUCCESS) {
            return Err(Error::Authentication(format!(
                "Expected status '{}', got {:?} (result: {:?})",
                STATUS_SUCCESS, login.status, login.result
            )));
        }

        if login.result.as_deref() != Some(RESULT_AUTHORIZED) {
            return Err(Error::Authentication(format!(
                "Expected result '{}', got {:?}",
                RESULT_AUTHORIZED, login.result
            )));
        }

        let token = login
            .token
            .and_then(BearerToken::new)
            .ok_or_else(|| Error::Authentication("Login succeeded but no token was returned".to_string()))?;

        debug!(expires = ?login.expires, "Bearer token acquired");

        Ok(SessionContext::authenticated(self.base_url.clone(), token))
    }
}
