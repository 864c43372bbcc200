//! reqwest-backed transport and shared HTTP helpers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ParleyError, Result};

use super::{AgentTransport, RawResponse};

/// Build the HTTP client used for agent calls and image downloads.
pub fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Default headers for JSON exchanges with the agent server.
pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Convert a reqwest failure, reporting deadline expiry as [`ParleyError::Timeout`].
pub fn classify(error: reqwest::Error, timeout: Duration) -> ParleyError {
    if error.is_timeout() {
        ParleyError::Timeout(timeout.as_millis() as u64)
    } else {
        error.into()
    }
}

/// Transport that talks to a live agent server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(build_client()?, timeout))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<RawResponse> {
        let resp = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| classify(e, self.timeout))?;
        debug!(status, bytes = body.len(), "agent server responded");
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn post_json(&self, url: &Url, body: &Value) -> Result<RawResponse> {
        debug!(%url, "POST");
        self.execute(
            self.client
                .post(url.clone())
                .headers(json_headers())
                .json(body),
        )
        .await
    }

    async fn delete(&self, url: &Url) -> Result<RawResponse> {
        debug!(%url, "DELETE");
        self.execute(self.client.delete(url.clone()).headers(json_headers()))
            .await
    }
}
