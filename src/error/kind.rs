//! Failure classification.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Broad failure kind, used to route display and recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    Connection,
    Http,
    EmptyPayload,
    Decode,
    Timeout,
    Network,
    Io,
    Configuration,
    InvalidArgument,
    InvalidState,
}

impl FailureKind {
    /// Whether the failure was detected locally, before anything was sent.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            Self::EmptyPayload
                | Self::Io
                | Self::Configuration
                | Self::InvalidArgument
                | Self::InvalidState
        )
    }
}
