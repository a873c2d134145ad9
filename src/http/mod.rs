//! HTTP plumbing
//!
//! The runner and authenticator talk to the service through the
//! [`HttpTransport`] trait. [`ReqwestTransport`] is the real implementation;
//! tests substitute their own.

mod client;

pub use client::ReqwestTransport;

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::Value;

use crate::common::{Error, Result};

/// A fully rendered request, ready to send
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// JSON body, serialized by the transport
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and body captured from one exchange
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed body. Empty bodies are `Null`, non-JSON bodies are kept as a string.
    pub body: Value,
    /// Body text exactly as received
    pub raw: String,
}

impl ApiResponse {
    pub fn new(status: u16, raw: String) -> Self {
        let body = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw).unwrap_or_else(|_| Value::String(raw.clone()))
        };
        Self { status, body, raw }
    }
}

/// Sends requests to the service under test
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and capture the response.
    ///
    /// Any HTTP status is a successful exchange; only failures to get a
    /// response at all are errors.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Resolve a path template like `/Account/v1/User/{username}` against a base URL
///
/// `{name}` segments are replaced by the matching entry in `params` and
/// percent-encoded as a single path segment. Any prefix path on the base
/// URL is kept. Partial placeholders (`v{n}`) and query or fragment
/// suffixes are rejected.
pub fn resolve_path(base: &Url, path: &str, params: &BTreeMap<String, String>) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("Base URL '{}' cannot carry a path", base)))?;
        segments.pop_if_empty();

        for raw in path.split('/').filter(|s| !s.is_empty()) {
            match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    let value = params.get(name).ok_or_else(|| {
                        Error::Template(format!("No value for path parameter '{}' in '{}'", name, path))
                    })?;
                    segments.push(value);
                }
                None if raw.contains(['{', '}', '?', '#']) => {
                    return Err(Error::Template(format!(
                        "Unsupported path segment '{}' in '{}': parameters must fill a whole segment",
                        raw, path
                    )));
                }
                None => {
                    segments.push(raw);
                }
            }
        }
    }
    Ok(url)
}
