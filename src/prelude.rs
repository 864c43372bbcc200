//! Convenience re-exports.

pub use crate::client::{ChatSession, ImageSource, Turn, UserInput};
pub use crate::config::ClientConfig;
pub use crate::conversation::{ConversationLog, ImageRef, LogEntry};
pub use crate::dispatch::MessageDispatcher;
pub use crate::error::{FailureKind, ParleyError, Result};
pub use crate::media::{EncodedImage, MediaEncoder};
pub use crate::session::{SessionHandle, SessionKey, SessionManager, SessionOrigin, SessionState};
pub use crate::transport::{AgentTransport, Endpoints, HttpTransport, RawResponse};
pub use crate::types::{AgentReply, Message, Part, ReplyPolicy, Role, NO_READABLE_RESPONSE};
