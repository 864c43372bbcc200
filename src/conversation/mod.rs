//! In-memory conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Image shown alongside a user entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageRef {
    /// Remote image, referenced by the URL the user gave.
    Url { url: String },
    /// Local image the user supplied directly.
    Upload { name: String, mime_type: String },
}

impl ImageRef {
    pub fn label(&self) -> &str {
        match self {
            Self::Url { url } => url,
            Self::Upload { name, .. } => name,
        }
    }
}

/// One displayed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    /// Set on assistant entries that carry failure text instead of a reply.
    #[serde(default)]
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn user(text: impl Into<String>, image: Option<ImageRef>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            image: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Assistant entry standing in for a reply that could not be obtained.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(text)
        }
    }
}

/// Ordered, append-only record of the exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in insertion order.
    pub fn snapshot(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
