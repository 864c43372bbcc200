//! Remote session lifecycle.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::transport::{AgentTransport, Endpoints};

/// Identifies a session on the agent server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// How an ensured session came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    Created,
    /// The server already had this session (409) and it is reused as is.
    Existing,
}

/// A session the server has acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHandle {
    pub key: SessionKey,
    pub origin: SessionOrigin,
    /// Server-side state blob, when the create response carried one.
    pub state: Option<Value>,
}

/// Lifecycle of the session held by a chat context.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Active(SessionHandle),
}

impl SessionState {
    pub fn handle(&self) -> Option<&SessionHandle> {
        match self {
            Self::Active(handle) => Some(handle),
            Self::Uninitialized => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Creates, reuses and deletes sessions on the agent server.
#[derive(Clone)]
pub struct SessionManager {
    transport: Arc<dyn AgentTransport>,
    endpoints: Endpoints,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("endpoints", &self.endpoints)
            .field("transport", &"..")
            .finish()
    }
}

impl SessionManager {
    pub fn new(transport: Arc<dyn AgentTransport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Create the session, or reuse it if the server reports a conflict.
    pub async fn ensure_session(
        &self,
        key: &SessionKey,
        initial_state: &Value,
    ) -> Result<SessionHandle> {
        let url = self.endpoints.session(key)?;
        debug!(session = %key, "ensuring session");

        let resp = self
            .transport
            .post_json(&url, &json!({ "state": initial_state }))
            .await?;

        if resp.status == 409 {
            info!(session = %key, "session already exists, reusing it");
            return Ok(SessionHandle {
                key: key.clone(),
                origin: SessionOrigin::Existing,
                state: None,
            });
        }
        if !resp.is_success() {
            warn!(session = %key, status = resp.status, "session creation failed");
            return Err(resp.into_error());
        }

        info!(session = %key, "session created");
        let state = resp
            .json()
            .ok()
            .and_then(|body| body.get("state").cloned());
        Ok(SessionHandle {
            key: key.clone(),
            origin: SessionOrigin::Created,
            state,
        })
    }

    /// Delete the session. A session the server no longer knows counts as deleted.
    pub async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        let url = self.endpoints.session(key)?;
        debug!(session = %key, "deleting session");

        let resp = self.transport.delete(&url).await?;
        if resp.is_success() || resp.status == 404 {
            info!(session = %key, status = resp.status, "session deleted");
            return Ok(());
        }
        warn!(session = %key, status = resp.status, "session deletion failed");
        Err(resp.into_error())
    }
}
