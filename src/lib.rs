//! parley: chat client for remote agent run APIs.
//!
//! Holds one conversational session against an agent server, sends text and
//! inline images to its run endpoint, and keeps the exchanged messages in an
//! in-memory log.
//!
//! # Quick Start
//!
//! ```no_run
//! use parley::prelude::*;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let mut chat = ChatSession::new(ClientConfig::from_env()?)?;
//! chat.ensure_session().await?;
//! let turn = chat.submit(UserInput::text("Hello!")).await?;
//! println!("{}", turn.reply);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod media;
pub mod prelude;
pub mod session;
pub mod transport;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
