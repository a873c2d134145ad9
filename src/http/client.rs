//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::common::{Error, Result};

use super::{ApiRequest, ApiResponse, HttpTransport};

/// User agent sent with every request
const USER_AGENT: &str = concat!("bookstore-checks/", env!("CARGO_PKG_VERSION"));

/// Transport over a shared reqwest client
///
/// The client holds a connection pool, so one instance serves the whole run.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method.clone(), url.clone());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        debug!(%method, %url, body = ?body, "Sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(&method, url.as_str(), e))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| Error::transport(&method, url.as_str(), e))?;

        debug!(%method, %url, status, body = %raw, "Received response");

        Ok(ApiResponse::new(status, raw))
    }
}
