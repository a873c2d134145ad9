//! Error types for the check suite
//!
//! Setup problems (bad configuration, failed login) are fatal for the whole
//! run. Assertion and transport problems are caught per scenario by the
//! runner and reported, so they never abort sibling scenarios.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the check suite
#[derive(Error, Debug)]
pub enum Error {
    // === Setup Errors ===
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Scenario requires a bearer token but the session is not authenticated")]
    NotAuthenticated,

    // === Transport Errors ===
    #[error("Request {method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // === Scenario Errors ===
    #[error("Template error: {0}")]
    Template(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a transport error for a request that never got a response
    pub fn transport(method: &reqwest::Method, url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            method: method.to_string(),
            url: url.to_string(),
            source,
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
