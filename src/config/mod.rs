//! Configuration system (layered: defaults > config file > env > explicit overrides).

use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ParleyError, Result};
use crate::session::SessionKey;
use crate::types::ReplyPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_APP_NAME: &str = "search";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 10;

/// Environment variables read by [`ClientConfig::from_env`].
pub const ENV_VARS: [&str; 8] = [
    "PARLEY_BASE_URL",
    "PARLEY_APP_NAME",
    "PARLEY_USER_ID",
    "PARLEY_SESSION_ID",
    "PARLEY_INITIAL_STATE",
    "PARLEY_REQUEST_TIMEOUT_SECS",
    "PARLEY_IMAGE_TIMEOUT_SECS",
    "PARLEY_REPLY_POLICY",
];

/// Connection and session settings for one chat client.
///
/// Example:
/// ```
/// use parley::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:9000")
///     .app_name("image_agent")
///     .user_id("u_1")
///     .session_id("s_1")
///     .build();
/// assert_eq!(config.image_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(into, default = DEFAULT_APP_NAME.to_string())]
    pub app_name: String,
    #[builder(into, default = generated_id("user"))]
    pub user_id: String,
    #[builder(into, default = generated_id("session"))]
    pub session_id: String,
    /// State blob sent when a session is created. Must be a JSON object.
    #[builder(default = Value::Object(Default::default()))]
    pub initial_state: Value,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    #[builder(default = DEFAULT_IMAGE_TIMEOUT_SECS)]
    pub image_timeout_secs: u64,
    #[builder(default)]
    pub reply_policy: ReplyPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn generated_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

impl ClientConfig {
    /// Defaults overridden by environment variables (a `.env` file is loaded first).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::default().apply_env()?.validated()
    }

    /// Parse a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::read_file(path)?.validated()
    }

    fn read_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Resolve the full layered configuration and validate it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::layered(path)?.validated()
    }

    /// Defaults, then the config file, then the environment, unvalidated so
    /// callers can layer further overrides first.
    ///
    /// An explicit `path` must exist; the default path is used only if present.
    pub fn layered(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let base = match path {
            Some(path) => Self::read_file(path)?,
            None => {
                let default_path = default_config_path();
                if default_path.is_file() {
                    Self::read_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        base.apply_env()
    }

    /// Override fields from `PARLEY_*` environment variables.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Override fields from any variable source.
    ///
    /// Values are parsed here; [`ClientConfig::validate`] checks the result.
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("PARLEY_BASE_URL") {
            self.base_url = url;
        }
        if let Some(app) = lookup("PARLEY_APP_NAME") {
            self.app_name = app;
        }
        if let Some(user) = lookup("PARLEY_USER_ID") {
            self.user_id = user;
        }
        if let Some(session) = lookup("PARLEY_SESSION_ID") {
            self.session_id = session;
        }
        if let Some(raw) = lookup("PARLEY_INITIAL_STATE") {
            self.initial_state = serde_json::from_str(&raw).map_err(|e| {
                ParleyError::Configuration(format!("PARLEY_INITIAL_STATE is not valid JSON: {e}"))
            })?;
        }
        if let Some(raw) = lookup("PARLEY_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_secs("PARLEY_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("PARLEY_IMAGE_TIMEOUT_SECS") {
            self.image_timeout_secs = parse_secs("PARLEY_IMAGE_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("PARLEY_REPLY_POLICY") {
            self.reply_policy = raw.trim().parse().map_err(|_| {
                ParleyError::Configuration(format!(
                    "PARLEY_REPLY_POLICY must be first_event or last_text_event, got '{raw}'"
                ))
            })?;
        }
        Ok(self)
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Check that the settings can address a session.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            ParleyError::Configuration(format!("invalid base_url '{}': {e}", self.base_url))
        })?;
        for (name, value) in [
            ("app_name", &self.app_name),
            ("user_id", &self.user_id),
            ("session_id", &self.session_id),
        ] {
            if value.trim().is_empty() {
                return Err(ParleyError::Configuration(format!("{name} must not be empty")));
            }
        }
        if !self.initial_state.is_object() {
            return Err(ParleyError::Configuration(
                "initial_state must be a JSON object".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 || self.image_timeout_secs == 0 {
            return Err(ParleyError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(&self.app_name, &self.user_id, &self.session_id)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| ParleyError::Configuration(format!("{name} must be a whole number, got '{raw}'")))
}

/// `~/.parley/config.toml`.
pub fn default_config_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".parley"))
        .unwrap_or_else(|| PathBuf::from(".parley"))
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_generate_distinct_ids() {
        let a = ClientConfig::default();
        let b = ClientConfig::default();
        assert!(a.user_id.starts_with("user-"));
        assert!(a.session_id.starts_with("session-"));
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.base_url, DEFAULT_BASE_URL);
        assert_eq!(a.initial_state, serde_json::json!({}));
    }

    #[test]
    fn vars_override_every_field() {
        let config = ClientConfig::default()
            .apply_vars(vars(&[
                ("PARLEY_BASE_URL", "http://agent.internal:9000"),
                ("PARLEY_APP_NAME", "image_agent"),
                ("PARLEY_USER_ID", "u_123"),
                ("PARLEY_SESSION_ID", "s_123"),
                ("PARLEY_INITIAL_STATE", r#"{"key1":"value1","key2":42}"#),
                ("PARLEY_REQUEST_TIMEOUT_SECS", "30"),
                ("PARLEY_IMAGE_TIMEOUT_SECS", " 5 "),
                ("PARLEY_REPLY_POLICY", "last_text_event"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "http://agent.internal:9000");
        assert_eq!(config.session_key(), SessionKey::new("image_agent", "u_123", "s_123"));
        assert_eq!(config.initial_state["key2"], 42);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.image_timeout(), Duration::from_secs(5));
        assert_eq!(config.reply_policy, ReplyPolicy::LastTextEvent);
    }

    #[test]
    fn bad_values_are_configuration_errors() {
        for pairs in [
            vec![("PARLEY_INITIAL_STATE", "{not json")],
            vec![("PARLEY_INITIAL_STATE", "[1,2]")],
            vec![("PARLEY_IMAGE_TIMEOUT_SECS", "ten")],
            vec![("PARLEY_IMAGE_TIMEOUT_SECS", "0")],
            vec![("PARLEY_REPLY_POLICY", "newest")],
            vec![("PARLEY_BASE_URL", "not a url")],
            vec![("PARLEY_SESSION_ID", "  ")],
        ] {
            let err = ClientConfig::default()
                .apply_vars(vars(&pairs))
                .and_then(|config| config.validate())
                .unwrap_err();
            assert!(
                matches!(err, ParleyError::Configuration(_)),
                "{pairs:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn vars_are_not_validated_until_asked() {
        let config = ClientConfig::default()
            .apply_vars(vars(&[("PARLEY_BASE_URL", "not a url")]))
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_path_ends_in_parley_dir() {
        let path = default_config_path();
        assert!(path.ends_with(".parley/config.toml"));
    }
}
