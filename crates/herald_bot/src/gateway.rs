//! The seam between the supervisor and the chat platform client.
//!
//! The supervisor only ever talks to these traits. The serenity-backed
//! implementation lives behind the `discord` feature; tests drive the
//! supervisor with in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use herald_commands::{CommandRegistrar, Interaction};
use herald_config::PresenceSpec;
use herald_error::{ConnectionError, GatewayError};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Credentials for one login.
#[derive(Clone, PartialEq, Eq, Getters)]
pub struct LoginSettings {
    /// Bot token
    token: String,
    /// Application (client) id
    application_id: String,
}

impl LoginSettings {
    /// Settings for a login with the given credentials.
    pub fn new(token: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            application_id: application_id.into(),
        }
    }
}

impl std::fmt::Debug for LoginSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSettings")
            .field("token", &"<redacted>")
            .field("application_id", &self.application_id)
            .finish()
    }
}

/// Lifecycle and inbound events of one session.
#[derive(Debug)]
pub enum GatewayEvent {
    /// Session is fully connected
    Ready {
        /// Bot account name
        bot_name: String,
    },
    /// Session was lost and will not come back on its own
    Disconnected {
        /// What the client reported
        reason: String,
    },
    /// Non-fatal client error
    Error(String),
    /// A slash command invocation
    Interaction(Interaction),
}

/// Counters and names the presence placeholders draw from.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PresenceSnapshot {
    /// Members across all guilds
    members: u64,
    /// Guilds the bot is in
    guilds: u64,
    /// Distinct users seen
    users: u64,
    /// Bot account name
    bot_name: String,
    /// Name of the first guild, if any
    server_name: Option<String>,
    /// Moment the snapshot was taken
    timestamp: DateTime<Utc>,
}

impl PresenceSnapshot {
    /// Snapshot taken now.
    pub fn new(
        members: u64,
        guilds: u64,
        users: u64,
        bot_name: impl Into<String>,
        server_name: Option<String>,
    ) -> Self {
        Self::at(members, guilds, users, bot_name, server_name, Utc::now())
    }

    /// Snapshot with an explicit timestamp.
    pub fn at(
        members: u64,
        guilds: u64,
        users: u64,
        bot_name: impl Into<String>,
        server_name: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            members,
            guilds,
            users,
            bot_name: bot_name.into(),
            server_name,
            timestamp,
        }
    }
}

/// Validated changes to the bot account's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdit {
    /// New username
    pub username: Option<String>,
    /// Image to fetch and use as the avatar
    pub avatar: Option<Url>,
    /// New about-me text, placeholders already expanded
    pub bio: Option<String>,
}

impl ProfileEdit {
    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.avatar.is_none() && self.bio.is_none()
    }
}

/// One live connection to the gateway.
#[async_trait]
pub trait GatewaySession: Send + Sync {
    /// Close the connection; no events are delivered afterwards.
    async fn destroy(&self);

    /// Replace the bot's presence.
    async fn set_presence(&self, presence: &PresenceSpec) -> Result<(), GatewayError>;

    /// Edit the bot account's profile.
    async fn edit_profile(&self, edit: &ProfileEdit) -> Result<(), GatewayError>;

    /// Current counters for placeholder expansion.
    fn snapshot(&self) -> PresenceSnapshot;
}

/// Everything a successful login hands back.
pub struct GatewayConnection {
    /// The session itself
    pub session: Arc<dyn GatewaySession>,
    /// Command registration endpoint bound to the same credentials
    pub registrar: Arc<dyn CommandRegistrar>,
    /// Inbound event stream; closed when the session ends
    pub events: mpsc::UnboundedReceiver<GatewayEvent>,
}

/// Opens gateway sessions.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    /// Log in and open a session.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the platform rejects the credentials
    /// or the client cannot be built.
    async fn login(&self, settings: &LoginSettings) -> Result<GatewayConnection, ConnectionError>;
}

/// Cheap, cloneable reference to the supervisor's current session.
///
/// Callers can identify the session but not act on it; only the supervisor
/// opens and destroys sessions.
///
/// ```compile_fail
/// use herald_bot::GatewaySession;
///
/// async fn close(handle: herald_bot::SessionHandle) {
///     handle.session().destroy().await;
/// }
/// ```
#[derive(Clone)]
pub struct SessionHandle {
    id: u64,
    session: Arc<dyn GatewaySession>,
}

impl SessionHandle {
    pub(crate) fn new(id: u64, session: Arc<dyn GatewaySession>) -> Self {
        Self { id, session }
    }

    /// Supervisor-assigned session number, unique per process.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn session(&self) -> &Arc<dyn GatewaySession> {
        &self.session
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionHandle {}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.id).finish()
    }
}
