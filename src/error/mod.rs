//! Error types for parley.

pub mod kind;

pub use kind::FailureKind;

use thiserror::Error;

/// Primary error type for all parley operations.
///
/// A reply that carried no readable text is not an error; see
/// [`crate::types::AgentReply::Unreadable`].
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not connect to the agent server: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("HTTP error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("No content provided to send to the agent (message or image)")]
    EmptyPayload,

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ParleyError {
    /// Create an HTTP status error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Classify this error into a failure kind.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration(_) => FailureKind::Configuration,
            Self::Connection(_) => FailureKind::Connection,
            Self::Http { .. } => FailureKind::Http,
            Self::EmptyPayload => FailureKind::EmptyPayload,
            Self::Decode(_) => FailureKind::Decode,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Network(_) => FailureKind::Network,
            Self::Io(_) => FailureKind::Io,
            Self::InvalidArgument(_) => FailureKind::InvalidArgument,
            Self::InvalidState(_) => FailureKind::InvalidState,
        }
    }

    /// HTTP status, when the failure came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller could reasonably try the same operation again.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500..=599),
            _ => matches!(
                self.kind(),
                FailureKind::Connection | FailureKind::Timeout | FailureKind::Network
            ),
        }
    }

    /// Text shown to the user in place of an assistant reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(_) => {
                "Connection error: please ensure the agent API server is running.".to_string()
            }
            Self::Http { body, .. } => format!("Error communicating with agent: {body}"),
            Self::EmptyPayload => {
                "Error: No content provided to send to the agent (message or image).".to_string()
            }
            Self::Timeout(ms) => format!("The request timed out after {ms}ms."),
            Self::Configuration(msg) => format!("Configuration error: {msg}"),
            Self::InvalidState(msg) => format!("Error: {msg}"),
            Self::Decode(_)
            | Self::Network(_)
            | Self::Io(_)
            | Self::InvalidArgument(_) => "An internal error occurred.".to_string(),
        }
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

impl From<url::ParseError> for ParleyError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidArgument(error.to_string())
    }
}

impl From<reqwest::Error> for ParleyError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Self::Connection(error)
        } else if error.is_decode() || error.is_body() {
            Self::Decode(error.to_string())
        } else if error.is_builder() {
            Self::InvalidArgument(error.to_string())
        } else {
            Self::Network(error)
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;
