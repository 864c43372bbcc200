//! Outgoing message types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ParleyError, Result};

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Binary payload embedded directly in a message part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// A single unit of message content.
///
/// Serializes as `{"text": ...}` or `{"inlineData": {"mimeType": ..., "data": ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// A message sent to the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    /// Create a message, rejecting one with no parts.
    pub fn new(role: Role, parts: Vec<Part>) -> Result<Self> {
        if parts.is_empty() {
            return Err(ParleyError::EmptyPayload);
        }
        Ok(Self { role, parts })
    }

    /// Create a user message.
    pub fn user(parts: Vec<Part>) -> Result<Self> {
        Self::new(Role::User, parts)
    }
}
