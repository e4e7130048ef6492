//! Process-start settings.
//!
//! Loaded once at boot from an optional TOML file layered with `HERALD_*`
//! environment variables. These become the fallback snapshot of the
//! [`ConfigBinder`](crate::ConfigBinder).

use crate::{
    ActivityKind, CommandScope, DEFAULT_CALLBACK_URL, DEFAULT_INVITE_PERMISSIONS,
    DEFAULT_PRESENCE_TEXT, RuntimeConfig,
};
use derive_getters::Getters;
use herald_error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Boot settings for the bot process.
#[derive(Clone, Serialize, Deserialize, Getters)]
pub struct LocalSettings {
    /// Bot token
    #[serde(default)]
    token: Option<String>,
    /// Application (client) id
    #[serde(default)]
    application_id: Option<String>,
    /// OAuth client secret used by the dashboard
    #[serde(default)]
    client_secret: Option<String>,
    /// Dashboard session secret
    #[serde(default)]
    session_secret: Option<String>,
    /// Guild for guild-scoped command registration
    #[serde(default)]
    guild_id: Option<String>,
    /// OAuth callback URL
    #[serde(default = "default_callback_url")]
    callback_url: String,
    /// Presence text
    #[serde(default = "default_presence_text")]
    presence_text: String,
    /// Presence activity code
    #[serde(default)]
    presence_type: u8,
    /// Command registration scope
    #[serde(default)]
    command_scope: CommandScope,
    /// Invite permission bitmask
    #[serde(default = "default_invite_permissions")]
    invite_permissions: String,
    /// Directory holding command manifests
    #[serde(default = "default_commands_dir")]
    commands_dir: PathBuf,
    /// Address the control API listens on
    #[serde(default = "default_listen")]
    listen: String,
    /// Persisted configuration document; `None` keeps settings in memory
    #[serde(default = "default_store_path")]
    store_path: Option<PathBuf>,
    /// Connect to the gateway on boot
    #[serde(default)]
    auto_start: bool,
}

fn default_callback_url() -> String {
    DEFAULT_CALLBACK_URL.to_string()
}

fn default_presence_text() -> String {
    DEFAULT_PRESENCE_TEXT.to_string()
}

fn default_invite_permissions() -> String {
    DEFAULT_INVITE_PERMISSIONS.to_string()
}

fn default_commands_dir() -> PathBuf {
    PathBuf::from("commands")
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_store_path() -> Option<PathBuf> {
    Some(PathBuf::from(".config/settings.json"))
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            token: None,
            application_id: None,
            client_secret: None,
            session_secret: None,
            guild_id: None,
            callback_url: default_callback_url(),
            presence_text: default_presence_text(),
            presence_type: 0,
            command_scope: CommandScope::default(),
            invite_permissions: default_invite_permissions(),
            commands_dir: default_commands_dir(),
            listen: default_listen(),
            store_path: default_store_path(),
            auto_start: false,
        }
    }
}

impl LocalSettings {
    /// Load settings from `path` (if it exists) and `HERALD_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be parsed, or when a
    /// value has the wrong type.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Reading settings file");
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix("HERALD"))
            .build()
            .and_then(|raw| raw.try_deserialize::<Self>())
            .map_err(|e| ConfigError::new(format!("Failed to load settings: {e}")))
    }

    /// Parse settings from a TOML string, ignoring the environment.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse settings: {e}")))
    }

    /// Override the token, e.g. from a CLI flag.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.token = token;
        }
        self
    }

    /// Override the application id.
    pub fn with_application_id(mut self, application_id: Option<String>) -> Self {
        if application_id.is_some() {
            self.application_id = application_id;
        }
        self
    }

    /// Override the guild id.
    pub fn with_guild_id(mut self, guild_id: Option<String>) -> Self {
        if guild_id.is_some() {
            self.guild_id = guild_id;
        }
        self
    }

    /// Whether the dashboard has everything it needs to run (setup complete).
    pub fn is_configured(&self) -> bool {
        [
            &self.token,
            &self.application_id,
            &self.client_secret,
            &self.session_secret,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Snapshot used as the binder fallback.
    pub fn runtime_fallback(&self) -> RuntimeConfig {
        let presence_type = ActivityKind::from_code(self.presence_type).unwrap_or_else(|| {
            warn!(code = self.presence_type, "Unknown presence type, using Playing");
            ActivityKind::Playing
        });
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        RuntimeConfig {
            token: non_empty(&self.token),
            application_id: non_empty(&self.application_id),
            guild_id: non_empty(&self.guild_id),
            command_scope: self.command_scope,
            invite_permissions: self.invite_permissions.clone(),
            presence_text: self.presence_text.clone(),
            presence_type,
            callback_url: Some(self.callback_url.clone()),
        }
    }
}

impl std::fmt::Debug for LocalSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("LocalSettings")
            .field("token", &redact(&self.token))
            .field("application_id", &self.application_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("session_secret", &redact(&self.session_secret))
            .field("guild_id", &self.guild_id)
            .field("command_scope", &self.command_scope)
            .field("commands_dir", &self.commands_dir)
            .field("listen", &self.listen)
            .field("store_path", &self.store_path)
            .field("auto_start", &self.auto_start)
            .finish_non_exhaustive()
    }
}
