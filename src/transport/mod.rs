//! HTTP seam between the client and the agent server.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::{ParleyError, Result};
use crate::session::SessionKey;

/// Status and body of a completed HTTP exchange.
///
/// Any status is a completed exchange; interpreting it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn into_error(self) -> ParleyError {
        ParleyError::http(self.status, self.body)
    }
}

/// Issues requests against the agent server.
///
/// Implementations fail only when no response was received; non-2xx
/// statuses come back as a [`RawResponse`].
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn post_json(&self, url: &Url, body: &Value) -> Result<RawResponse>;

    async fn delete(&self, url: &Url) -> Result<RawResponse>;
}

/// URLs of the agent server's endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            ParleyError::Configuration(format!("invalid base_url '{base_url}': {e}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(ParleyError::Configuration(format!(
                "base_url '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `{base}/apps/{app}/users/{user}/sessions/{session}`
    pub fn session(&self, key: &SessionKey) -> Result<Url> {
        self.join(&[
            "apps",
            key.app_name.as_str(),
            "users",
            key.user_id.as_str(),
            "sessions",
            key.session_id.as_str(),
        ])
    }

    /// `{base}/run`
    pub fn run(&self) -> Result<Url> {
        self.join(&["run"])
    }

    fn join(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ParleyError::Configuration(format!("base_url '{}' cannot carry a path", self.base))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}
