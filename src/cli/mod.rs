//! CLI entry point for parley.

pub mod repl;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::client::{ImageSource, UserInput};
use crate::config::ClientConfig;
use crate::error::{ParleyError, Result};

/// parley CLI
#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Chat with a remote agent server")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the config file and environment.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Config file (default: ~/.parley/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Agent server base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// App name on the agent server
    #[arg(long = "app", global = true)]
    pub app_name: Option<String>,

    /// User id
    #[arg(long = "user", global = true)]
    pub user_id: Option<String>,

    /// Session id
    #[arg(long = "session", global = true)]
    pub session_id: Option<String>,
}

impl ConnectionArgs {
    /// Layer these flags over `config`.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(app) = &self.app_name {
            config.app_name = app.clone();
        }
        if let Some(user) = &self.user_id {
            config.user_id = user.clone();
        }
        if let Some(session) = &self.session_id {
            config.session_id = session.clone();
        }
        config
    }

    /// Load config file and environment, then apply the flags.
    pub fn resolve(&self) -> Result<ClientConfig> {
        self.finish(ClientConfig::layered(self.config.as_deref())?)
    }

    /// Apply the flags over `layered` and validate the outcome.
    pub fn finish(&self, layered: ClientConfig) -> Result<ClientConfig> {
        let config = self.apply(layered);
        config.validate()?;
        Ok(config)
    }
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat
    Chat,
    /// Send a single message and print the reply
    Send(SendArgs),
    /// Session management
    Session(SessionArgs),
}

/// Arguments for `parley send`.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Image to download and attach
    #[arg(long, conflicts_with = "image_file")]
    pub image_url: Option<String>,

    /// Local image file to attach
    #[arg(long)]
    pub image_file: Option<PathBuf>,

    /// Message text (positional)
    pub text: Option<String>,
}

impl SendArgs {
    pub fn to_input(&self) -> UserInput {
        let image = match (&self.image_url, &self.image_file) {
            (Some(url), _) => Some(ImageSource::Url(url.clone())),
            (None, Some(path)) => Some(ImageSource::Path(path.clone())),
            (None, None) => None,
        };
        UserInput {
            text: self.text.clone(),
            image,
        }
    }

    /// The input to send, rejected up front when there is nothing in it.
    pub fn input(&self) -> Result<UserInput> {
        let input = self.to_input();
        if input.is_empty() {
            return Err(ParleyError::EmptyPayload);
        }
        Ok(input)
    }
}

/// Arguments for the `session` subcommand group.
#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Create the session, or confirm it already exists
    Ensure,
    /// Delete the session on the server
    Delete,
}
