//! Agent response events and reply extraction.
//!
//! The run endpoint answers with a sequence of events. Each level of an event
//! is optional, and a nested value with an unexpected shape is read as absent
//! rather than failing the whole response.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use super::message::InlineData;

/// Text shown when the agent answered but no text part could be found.
pub const NO_READABLE_RESPONSE: &str =
    "Agent did not return a readable text response in the expected format.";

/// One event from the agent's response stream.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RunEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<EventContent>,
}

/// Content carried by an event.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EventContent {
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub parts: Option<Vec<EventPart>>,
}

/// A part inside event content. Parts that are not objects read as empty.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventPart {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub inline_data: Option<InlineData>,
}

impl RunEvent {
    /// Parts of this event's content, if it has any.
    pub fn parts(&self) -> &[EventPart] {
        self.content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[])
    }

    /// Text of the first part that has a text field.
    pub fn first_text(&self) -> Option<&str> {
        self.parts().iter().find_map(|part| part.text.as_deref())
    }
}

/// Parsed body of a run response.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResponse {
    /// A sequence of events, from a bare array or an `{"events": [...]}` object.
    Events(Vec<RunEvent>),
    /// Valid JSON of any other shape.
    Unrecognized(Value),
}

impl RunResponse {
    pub fn from_value(value: Value) -> Self {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("events") {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    map.insert("events".to_string(), other);
                    return Self::Unrecognized(Value::Object(map));
                }
                None => return Self::Unrecognized(Value::Object(map)),
            },
            other => return Self::Unrecognized(other),
        };

        Self::Events(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )
    }

    pub fn events(&self) -> &[RunEvent] {
        match self {
            Self::Events(events) => events,
            Self::Unrecognized(_) => &[],
        }
    }
}

/// Which event a reply is read from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReplyPolicy {
    /// Only the first event is inspected.
    #[default]
    FirstEvent,
    /// The last event that carries a text part. Suited to agents that emit
    /// tool-call events before their final answer.
    LastTextEvent,
}

/// Outcome of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    Text(String),
    /// The agent answered, but with nothing readable as text.
    Unreadable,
}

impl AgentReply {
    /// Reply text, or [`NO_READABLE_RESPONSE`].
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Unreadable => NO_READABLE_RESPONSE,
        }
    }

    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Unreadable => NO_READABLE_RESPONSE.to_string(),
        }
    }
}

impl fmt::Display for AgentReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Pick the reply text out of a run response.
pub fn extract_reply(response: &RunResponse, policy: ReplyPolicy) -> AgentReply {
    let events = response.events();
    let text = match policy {
        ReplyPolicy::FirstEvent => events.first().and_then(RunEvent::first_text),
        ReplyPolicy::LastTextEvent => events.iter().rev().find_map(RunEvent::first_text),
    };
    match text {
        Some(text) => AgentReply::Text(text.to_string()),
        None => AgentReply::Unreadable,
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        )),
        _ => Ok(None),
    }
}
