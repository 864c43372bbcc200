//! Message dispatch to the agent's run endpoint.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::media::EncodedImage;
use crate::session::{SessionHandle, SessionKey};
use crate::transport::{AgentTransport, Endpoints};
use crate::types::{extract_reply, AgentReply, Message, Part, ReplyPolicy, RunResponse};

/// Body posted to the run endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(flatten)]
    pub session: SessionKey,
    pub new_message: Message,
}

/// Parts for a user turn: the text first, then the image.
///
/// Empty text adds nothing. An image missing its data or MIME type is skipped.
pub fn build_parts(text: Option<&str>, image: Option<&EncodedImage>) -> Vec<Part> {
    let mut parts = Vec::with_capacity(2);
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        parts.push(Part::text(text));
    }
    if let Some(image) = image {
        match image.to_part() {
            Some(part) => parts.push(part),
            None => warn!("image data or MIME type is missing, skipping image"),
        }
    }
    parts
}

/// Sends user turns and reads back the agent's reply.
#[derive(Clone)]
pub struct MessageDispatcher {
    transport: Arc<dyn AgentTransport>,
    endpoints: Endpoints,
    policy: ReplyPolicy,
}

impl fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("endpoints", &self.endpoints)
            .field("policy", &self.policy)
            .field("transport", &"..")
            .finish()
    }
}

impl MessageDispatcher {
    pub fn new(transport: Arc<dyn AgentTransport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            policy: ReplyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReplyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Send text and/or an image within `session`.
    ///
    /// Fails with [`crate::error::ParleyError::EmptyPayload`] before any request when there
    /// is nothing to send. A reply without readable text is
    /// [`AgentReply::Unreadable`], not an error.
    pub async fn send_message(
        &self,
        session: &SessionHandle,
        text: Option<&str>,
        image: Option<&EncodedImage>,
    ) -> Result<AgentReply> {
        let new_message = Message::user(build_parts(text, image))?;
        let request = RunRequest {
            session: session.key.clone(),
            new_message,
        };
        let url = self.endpoints.run()?;
        debug!(
            session = %session.key,
            parts = request.new_message.parts.len(),
            "sending message"
        );

        let body = serde_json::to_value(&request)?;
        let resp = self.transport.post_json(&url, &body).await?;
        if !resp.is_success() {
            warn!(session = %session.key, status = resp.status, "run request failed");
            return Err(resp.into_error());
        }

        let response = RunResponse::from_value(resp.json()?);
        let reply = extract_reply(&response, self.policy);
        if !reply.is_readable() {
            warn!(
                session = %session.key,
                events = response.events().len(),
                "agent reply had no readable text"
            );
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn image() -> EncodedImage {
        EncodedImage {
            data: "AAEC".to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    #[test]
    fn text_comes_before_image() {
        let parts = build_parts(Some("what is this?"), Some(&image()));
        assert_eq!(
            parts,
            vec![Part::text("what is this?"), Part::inline_data("image/png", "AAEC")]
        );
    }

    #[test]
    fn empty_text_is_dropped() {
        assert_eq!(build_parts(Some(""), Some(&image())).len(), 1);
        assert!(build_parts(Some(""), None).is_empty());
        assert!(build_parts(None, None).is_empty());
    }

    #[test]
    fn image_without_mime_type_is_skipped() {
        let incomplete = EncodedImage {
            data: "AAEC".to_string(),
            mime_type: String::new(),
        };
        assert_eq!(build_parts(Some("hi"), Some(&incomplete)), vec![Part::text("hi")]);
    }

    #[test]
    fn run_request_wire_shape() {
        let request = RunRequest {
            session: SessionKey::new("search", "u_123", "s_123"),
            new_message: Message::user(vec![Part::text("hi")]).unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "appName": "search",
                "userId": "u_123",
                "sessionId": "s_123",
                "newMessage": {"role": "user", "parts": [{"text": "hi"}]}
            })
        );
    }
}
