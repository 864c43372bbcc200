//! Wire types exchanged with the agent server.

pub mod event;
pub mod message;

pub use event::*;
pub use message::*;
