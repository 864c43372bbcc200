//! Chat session context: one remote session, its log, and the boundary where
//! failures become displayable text.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::conversation::{ConversationLog, ImageRef, LogEntry};
use crate::dispatch::MessageDispatcher;
use crate::error::{ParleyError, Result};
use crate::media::{
    declared_image_mime, guess_image_mime, EncodedImage, MediaEncoder, FALLBACK_MIME_TYPE,
};
use crate::session::{SessionHandle, SessionManager, SessionState};
use crate::transport::http::build_client;
use crate::transport::{AgentTransport, Endpoints, HttpTransport};

/// Where a user-supplied image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Bytes {
        name: String,
        mime_type: String,
        data: Vec<u8>,
    },
    Path(PathBuf),
}

impl ImageSource {
    fn is_blank(&self) -> bool {
        match self {
            Self::Url(url) => url.trim().is_empty(),
            Self::Bytes { data, .. } => data.is_empty(),
            Self::Path(path) => path.as_os_str().is_empty(),
        }
    }

    fn image_ref(&self) -> ImageRef {
        match self {
            Self::Url(url) => ImageRef::Url { url: url.clone() },
            Self::Bytes {
                name, mime_type, ..
            } => ImageRef::Upload {
                name: name.clone(),
                mime_type: declared_image_mime(mime_type),
            },
            Self::Path(path) => ImageRef::Upload {
                name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                mime_type: guess_image_mime(&path.to_string_lossy())
                    .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()),
            },
        }
    }
}

/// What the user submitted in one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInput {
    pub text: Option<String>,
    pub image: Option<ImageSource>,
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageSource) -> Self {
        self.image = Some(image);
        self
    }

    pub fn is_empty(&self) -> bool {
        let no_text = self.text.as_deref().map_or(true, str::is_empty);
        let no_image = self.image.as_ref().map_or(true, ImageSource::is_blank);
        no_text && no_image
    }
}

/// Result of one submitted turn, as appended to the log.
#[derive(Debug)]
pub struct Turn {
    /// Text of the assistant entry: the reply, or the failure message.
    pub reply: String,
    /// Set when the message could not be exchanged.
    pub failure: Option<ParleyError>,
    /// Set when the image could not be encoded and was left out.
    pub image_failure: Option<ParleyError>,
}

impl Turn {
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// A conversation with one remote agent session.
///
/// Lifecycle: uninitialized -> active -> (reset). Every successful
/// (re)establishment starts a fresh, empty log.
#[derive(Debug)]
pub struct ChatSession {
    config: ClientConfig,
    sessions: SessionManager,
    dispatcher: MessageDispatcher,
    encoder: MediaEncoder,
    state: SessionState,
    log: ConversationLog,
}

impl ChatSession {
    /// Chat over HTTP with the server named in `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = build_client()?;
        let transport = Arc::new(HttpTransport::with_client(
            client.clone(),
            config.request_timeout(),
        ));
        Self::assemble(config, transport, client)
    }

    /// Chat through a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn AgentTransport>) -> Result<Self> {
        Self::assemble(config, transport, build_client()?)
    }

    fn assemble(
        config: ClientConfig,
        transport: Arc<dyn AgentTransport>,
        client: reqwest::Client,
    ) -> Result<Self> {
        config.validate()?;
        let endpoints = Endpoints::new(&config.base_url)?;
        Ok(Self {
            sessions: SessionManager::new(transport.clone(), endpoints.clone()),
            dispatcher: MessageDispatcher::new(transport, endpoints)
                .with_policy(config.reply_policy),
            encoder: MediaEncoder::new(client).with_timeout(config.image_timeout()),
            state: SessionState::Uninitialized,
            log: ConversationLog::new(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    fn active_handle(&self) -> Result<&SessionHandle> {
        self.state.handle().ok_or_else(|| {
            ParleyError::InvalidState("no active session; create one first".to_string())
        })
    }

    /// Create or reuse the configured session, clearing the log on success.
    ///
    /// On failure the previous state and log are kept.
    pub async fn ensure_session(&mut self) -> Result<&SessionHandle> {
        let key = self.config.session_key();
        let handle = self
            .sessions
            .ensure_session(&key, &self.config.initial_state)
            .await?;
        self.log.clear();
        self.state = SessionState::Active(handle);
        self.active_handle()
    }

    /// Start over: re-establish the session with an empty log.
    pub async fn reset_session(&mut self) -> Result<&SessionHandle> {
        info!(session = %self.config.session_key(), "resetting session");
        self.ensure_session().await
    }

    /// Delete the session on the server and return to the uninitialized state.
    pub async fn end_session(&mut self) -> Result<()> {
        let key = self.config.session_key();
        self.sessions.delete_session(&key).await?;
        self.state = SessionState::Uninitialized;
        self.log.clear();
        Ok(())
    }

    /// Send one user turn and record it.
    ///
    /// Errors are returned only when nothing was recorded: no active session,
    /// or an input with neither text nor image. Otherwise the user entry is
    /// appended, followed by either the reply or the failure text.
    pub async fn submit(&mut self, input: UserInput) -> Result<Turn> {
        let handle = self.active_handle()?.clone();
        if input.is_empty() {
            return Err(ParleyError::EmptyPayload);
        }

        let UserInput { text, image } = input;
        let mut image_failure = None;
        let (encoded, image_ref) = match image.filter(|source| !source.is_blank()) {
            Some(source) => {
                let image_ref = source.image_ref();
                match self.encode(source).await {
                    Ok(encoded) => (Some(encoded), Some(image_ref)),
                    Err(e) => {
                        warn!(error = %e, "image could not be encoded, sending without it");
                        image_failure = Some(e);
                        (None, Some(image_ref))
                    }
                }
            }
            None => (None, None),
        };

        self.log
            .append(LogEntry::user(text.clone().unwrap_or_default(), image_ref));

        let result = self
            .dispatcher
            .send_message(&handle, text.as_deref(), encoded.as_ref())
            .await;

        let turn = match result {
            Ok(reply) => {
                let reply = reply.into_text();
                self.log.append(LogEntry::assistant(&reply));
                Turn {
                    reply,
                    failure: None,
                    image_failure,
                }
            }
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "message exchange failed");
                let reply = e.user_message();
                self.log.append(LogEntry::failure(&reply));
                Turn {
                    reply,
                    failure: Some(e),
                    image_failure,
                }
            }
        };
        Ok(turn)
    }

    async fn encode(&self, source: ImageSource) -> Result<EncodedImage> {
        match source {
            ImageSource::Url(url) => self.encoder.encode_from_url(&url).await,
            ImageSource::Bytes {
                mime_type, data, ..
            } => Ok(MediaEncoder::encode_from_bytes(&data, &mime_type)),
            ImageSource::Path(path) => MediaEncoder::encode_from_path(&path, None).await,
        }
    }
}
