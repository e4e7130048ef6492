//! Live runtime settings and the presence they describe.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Default presence text when nothing else is configured.
pub const DEFAULT_PRESENCE_TEXT: &str = "Ready to serve";

/// Default invite permission mask (administrator).
pub const DEFAULT_INVITE_PERMISSIONS: &str = "8";

/// Default OAuth callback used by the dashboard.
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:8080/auth/discord/callback";

/// Where slash commands are registered.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CommandScope {
    /// Registered for every guild the bot is in
    Global,
    /// Registered for the configured guild only
    #[default]
    Guild,
}

/// Activity type shown next to the presence text.
///
/// Codes follow the platform's activity type numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(into = "u8", try_from = "u8")]
pub enum ActivityKind {
    /// "Playing ..."
    #[default]
    Playing,
    /// "Streaming ..."
    Streaming,
    /// "Listening to ..."
    Listening,
    /// "Watching ..."
    Watching,
    /// Custom status text
    Custom,
    /// "Competing in ..."
    Competing,
}

impl ActivityKind {
    /// Map a numeric activity code, `None` for codes outside 0..=5.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Playing),
            1 => Some(Self::Streaming),
            2 => Some(Self::Listening),
            3 => Some(Self::Watching),
            4 => Some(Self::Custom),
            5 => Some(Self::Competing),
            _ => None,
        }
    }

    /// Numeric activity code.
    pub fn code(self) -> u8 {
        match self {
            Self::Playing => 0,
            Self::Streaming => 1,
            Self::Listening => 2,
            Self::Watching => 3,
            Self::Custom => 4,
            Self::Competing => 5,
        }
    }
}

impl From<ActivityKind> for u8 {
    fn from(kind: ActivityKind) -> Self {
        kind.code()
    }
}

impl TryFrom<u8> for ActivityKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown activity type {code}"))
    }
}

/// Online status pushed with a presence update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PresenceStatus {
    /// Green dot
    #[default]
    Online,
    /// Away
    Idle,
    /// Do not disturb
    Dnd,
    /// Shown as offline
    Invisible,
}

/// Presence to push to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct PresenceSpec {
    /// Activity text, possibly containing placeholders
    text: String,
    /// Activity type
    #[builder(default)]
    kind: ActivityKind,
    /// Online status
    #[builder(default)]
    status: PresenceStatus,
}

impl PresenceSpec {
    /// Online presence with the given text and kind.
    pub fn online(text: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            text: text.into(),
            kind,
            status: PresenceStatus::Online,
        }
    }

    /// Same presence with its text replaced.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: self.kind,
            status: self.status,
        }
    }
}

/// Effective runtime settings.
///
/// One snapshot is captured at process start and kept as the fallback;
/// the live copy is only ever rewritten by [`crate::ConfigBinder`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct RuntimeConfig {
    /// Bot token
    #[serde(skip_serializing, default)]
    #[builder(default, setter(into, strip_option))]
    pub(crate) token: Option<String>,
    /// Application (client) id
    #[builder(default, setter(into, strip_option))]
    pub(crate) application_id: Option<String>,
    /// Guild used for guild-scoped command registration
    #[builder(default, setter(into, strip_option))]
    pub(crate) guild_id: Option<String>,
    /// Command registration scope
    #[builder(default)]
    pub(crate) command_scope: CommandScope,
    /// Permission bitmask used in invite links
    #[builder(default = "DEFAULT_INVITE_PERMISSIONS.to_string()")]
    pub(crate) invite_permissions: String,
    /// Presence text
    #[builder(default = "DEFAULT_PRESENCE_TEXT.to_string()")]
    pub(crate) presence_text: String,
    /// Presence activity type
    #[builder(default)]
    pub(crate) presence_type: ActivityKind,
    /// OAuth callback used by the dashboard
    #[builder(default, setter(into, strip_option))]
    pub(crate) callback_url: Option<String>,
}

impl RuntimeConfig {
    /// Start a builder.
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Presence derived from the configured text and type.
    pub fn presence(&self) -> PresenceSpec {
        PresenceSpec::online(self.presence_text.clone(), self.presence_type)
    }

    /// Guild id to register against, when the scope asks for one and one is set.
    pub fn registration_guild(&self) -> Option<&str> {
        match self.command_scope {
            CommandScope::Guild => self.guild_id.as_deref().filter(|id| !id.is_empty()),
            CommandScope::Global => None,
        }
    }

    /// Whether a login can be attempted.
    pub fn has_credentials(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
            && self.application_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            token: None,
            application_id: None,
            guild_id: None,
            command_scope: CommandScope::default(),
            invite_permissions: DEFAULT_INVITE_PERMISSIONS.to_string(),
            presence_text: DEFAULT_PRESENCE_TEXT.to_string(),
            presence_type: ActivityKind::default(),
            callback_url: None,
        }
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("command_scope", &self.command_scope)
            .field("invite_permissions", &self.invite_permissions)
            .field("presence_text", &self.presence_text)
            .field("presence_type", &self.presence_type)
            .field("callback_url", &self.callback_url)
            .finish()
    }
}
