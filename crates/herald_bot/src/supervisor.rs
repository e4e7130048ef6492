//! Owns the gateway session and drives its lifecycle.
//!
//! ```text
//! Stopped --start--> Starting --ready--> Running --disconnect--> Restarting
//!    ^                                      |                        |
//!    +-------------stop---------------------+--------stop------------+
//! ```
//!
//! Lifecycle operations (`start`, `stop`, `restart`, recovery attempts)
//! serialize on one async lock held for the whole operation, so at most one
//! session exists at any time.

use crate::{
    GatewayConnector, GatewayEvent, LoginSettings, ProfileUpdate,
    SessionHandle, expand, invite_link,
};
use futures::future::BoxFuture;
use herald_commands::{
    CommandRegistrar, CommandRegistry, HandlerCatalog, InteractionDispatcher, RegistrationTarget,
};
use herald_config::{
    ActivityKind, ConfigBinder, ConfigRecord, ConfigStore, PresenceSpec, RuntimeConfig,
    ensure_config,
};
use herald_error::{ConfigError, HeraldResult, RegistrationError};
use parking_lot::{Mutex as SyncMutex, RwLock};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, instrument, warn};

/// Recovery attempts allowed before the supervisor gives up.
pub const MAX_RECOVERY_ATTEMPTS: u32 = 5;

/// Presence text used when an activity update expands to nothing.
pub const EMPTY_ACTIVITY_TEXT: &str = "online";

/// Delay before recovery attempt `attempt` (counted from 1): `2^attempt` seconds.
pub fn recovery_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000u64.saturating_mul(1u64 << attempt.min(32)))
}

/// Where the supervisor is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    /// No session
    #[default]
    Stopped,
    /// Logged in, waiting for ready
    Starting,
    /// Session ready
    Running,
    /// Session lost, recovery pending or in progress
    Restarting,
}

/// Result of [`ConnectionSupervisor::apply_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    /// Credentials or command scope changed while a session is live
    pub restart_required: bool,
}

/// Point-in-time view of the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorStatus {
    /// Lifecycle state
    pub state: ConnectionState,
    /// Recovery attempts since the last ready
    pub recovery_attempts: u32,
    /// Commands in the current session's registry
    pub command_count: usize,
    /// Current session number
    pub session_id: Option<u64>,
}

/// Construction-time options for [`ConnectionSupervisor`].
#[derive(Clone)]
pub struct SupervisorOptions {
    commands_dir: PathBuf,
    catalog: HandlerCatalog,
    store: Option<Arc<dyn ConfigStore>>,
}

impl SupervisorOptions {
    /// Root of the command manifest tree.
    pub fn with_commands_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.commands_dir = dir.into();
        self
    }

    /// Handlers manifests may refer to.
    pub fn with_catalog(mut self, catalog: HandlerCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Persisted configuration read on every start; boot settings only without one.
    pub fn with_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Root of the command manifest tree.
    pub fn commands_dir(&self) -> &PathBuf {
        &self.commands_dir
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            commands_dir: PathBuf::from("commands"),
            catalog: HandlerCatalog::with_builtins(),
            store: None,
        }
    }
}

struct ActiveSession {
    handle: SessionHandle,
    pump: JoinHandle<()>,
}

#[derive(Default)]
struct Lifecycle {
    active: Option<ActiveSession>,
}

/// What `status` reports about the live session, readable without waiting
/// on a lifecycle operation.
#[derive(Debug, Clone, Copy)]
struct SessionSummary {
    id: u64,
    command_count: usize,
}

#[derive(Default)]
struct Recovery {
    attempts: u32,
    pending: Option<JoinHandle<()>>,
}

/// Keeps at most one gateway session alive and recovers it after disconnects.
pub struct ConnectionSupervisor {
    connector: Arc<dyn GatewayConnector>,
    options: SupervisorOptions,
    binder: RwLock<ConfigBinder>,
    dispatcher: InteractionDispatcher,
    lifecycle: Mutex<Lifecycle>,
    recovery: SyncMutex<Recovery>,
    current: SyncMutex<Option<SessionSummary>>,
    state: watch::Sender<ConnectionState>,
    next_session_id: AtomicU64,
    me: Weak<Self>,
}

impl ConnectionSupervisor {
    /// Supervisor in the `Stopped` state; `fallback` is the boot snapshot.
    pub fn new(
        connector: Arc<dyn GatewayConnector>,
        fallback: RuntimeConfig,
        options: SupervisorOptions,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(ConnectionState::Stopped);
        Arc::new_cyclic(|me| Self {
            connector,
            options,
            binder: RwLock::new(ConfigBinder::new(fallback)),
            dispatcher: InteractionDispatcher::new(),
            lifecycle: Mutex::new(Lifecycle::default()),
            recovery: SyncMutex::new(Recovery::default()),
            current: SyncMutex::new(None),
            state,
            next_session_id: AtomicU64::new(1),
            me: me.clone(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Effective runtime settings.
    pub fn config(&self) -> RuntimeConfig {
        self.binder.read().effective().clone()
    }

    /// Snapshot of state, recovery progress and the current session.
    ///
    /// Never waits for an in-progress login or recovery.
    pub async fn status(&self) -> SupervisorStatus {
        let current = *self.current.lock();
        SupervisorStatus {
            state: self.state(),
            recovery_attempts: self.recovery.lock().attempts,
            command_count: current.map_or(0, |summary| summary.command_count),
            session_id: current.map(|summary| summary.id),
        }
    }

    /// Open a session, or return the live one.
    ///
    /// Calling `start` while a session is starting or running has no side
    /// effects. While restarting, the pending recovery is cancelled and the
    /// dead session replaced.
    ///
    /// # Errors
    ///
    /// - [`ConfigError`] when the token or application id is missing
    /// - `StoreError` when the persisted configuration cannot be read
    /// - `ConnectionError` when the login is rejected
    /// - [`RegistrationError`] when command sync fails; the session stays open
    #[instrument(skip(self))]
    pub async fn start(&self) -> HeraldResult<SessionHandle> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.start_locked(&mut lifecycle).await
    }

    /// Close the session and cancel any pending recovery. No-op when stopped.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        self.stop_locked(&mut lifecycle).await;
    }

    /// `stop` followed by `start`, as one lifecycle operation.
    #[instrument(skip(self))]
    pub async fn restart(&self) -> HeraldResult<SessionHandle> {
        let mut lifecycle = self.lifecycle.lock().await;
        self.stop_locked(&mut lifecycle).await;
        self.start_locked(&mut lifecycle).await
    }

    /// Push a new activity. Without a session this does nothing.
    #[instrument(skip(self))]
    pub async fn set_activity(&self, kind: ActivityKind, text: &str) -> HeraldResult<()> {
        let lifecycle = self.lifecycle.lock().await;
        let Some(active) = &lifecycle.active else {
            debug!("No session, activity not pushed");
            return Ok(());
        };
        let session = active.handle.session();
        let mut expanded = expand(text, &session.snapshot());
        if expanded.trim().is_empty() {
            expanded = EMPTY_ACTIVITY_TEXT.to_string();
        }
        session
            .set_presence(&PresenceSpec::online(expanded, kind))
            .await?;
        info!("Activity updated");
        Ok(())
    }

    /// Edit the bot account's profile.
    ///
    /// Without a session this logs a warning and succeeds. Invalid avatar
    /// URLs and banners are logged and skipped.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> HeraldResult<()> {
        let lifecycle = self.lifecycle.lock().await;
        let Some(active) = &lifecycle.active else {
            warn!("Cannot update profile: bot is not running");
            return Ok(());
        };
        let session = active.handle.session();
        let edit = update.resolve(&session.snapshot());
        if edit.is_empty() {
            info!("No profile changes to apply");
            return Ok(());
        }
        session.edit_profile(&edit).await.inspect_err(|e| {
            error!(error = %e, "Failed to update bot profile");
        })?;
        info!("Bot profile updated");
        Ok(())
    }

    /// Bind `record` onto the effective settings.
    ///
    /// Takes effect for presence immediately on the next push; credential and
    /// scope changes need a restart, which is reported rather than performed.
    #[instrument(skip_all)]
    pub async fn apply_config(&self, record: &ConfigRecord) -> ApplyOutcome {
        let mut binder = self.binder.write();
        let before = binder.effective().clone();
        let after = binder.apply(record);
        let changed = before.token() != after.token()
            || before.application_id() != after.application_id()
            || before.command_scope() != after.command_scope();
        let restart_required = changed && self.current.lock().is_some();
        debug!(changed, restart_required, "Configuration applied");
        ApplyOutcome { restart_required }
    }

    /// Invite link for the effective application id.
    ///
    /// `permissions` overrides the configured mask when given.
    pub fn invite_link(&self, permissions: Option<&str>) -> Result<String, ConfigError> {
        let binder = self.binder.read();
        let config = binder.effective();
        let application_id = config
            .application_id()
            .as_deref()
            .ok_or_else(|| ConfigError::new("Missing application id, cannot build invite link"))?;
        let permissions = permissions
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(config.invite_permissions().as_str());
        invite_link(application_id, permissions).map(String::from)
    }

    async fn start_locked(&self, lifecycle: &mut Lifecycle) -> HeraldResult<SessionHandle> {
        if let Some(active) = &lifecycle.active {
            if self.state() != ConnectionState::Restarting {
                debug!(session = active.handle.id(), "Session already live");
                return Ok(active.handle.clone());
            }
        }

        self.cancel_recovery();
        self.teardown(lifecycle).await;

        match self.connect(lifecycle, ConnectionState::Starting).await {
            Ok((handle, registered)) => {
                registered?;
                Ok(handle)
            }
            Err(e) => {
                self.set_state(ConnectionState::Stopped);
                Err(e)
            }
        }
    }

    async fn stop_locked(&self, lifecycle: &mut Lifecycle) {
        self.cancel_recovery();
        if lifecycle.active.is_none() && self.state() == ConnectionState::Stopped {
            debug!("Already stopped");
            return;
        }
        self.teardown(lifecycle).await;
        self.set_state(ConnectionState::Stopped);
        info!("Bot stopped");
    }

    /// Resolve settings, load commands, log in, subscribe and register.
    ///
    /// The outer result fails when no session could be opened; the inner one
    /// reports command registration against the session that was opened.
    async fn connect(
        &self,
        lifecycle: &mut Lifecycle,
        connecting: ConnectionState,
    ) -> HeraldResult<(SessionHandle, Result<usize, RegistrationError>)> {
        let config = self.resolve_config().await?;
        let (Some(token), Some(application_id)) = (
            config.token().as_deref().filter(|t| !t.is_empty()),
            config.application_id().as_deref().filter(|id| !id.is_empty()),
        ) else {
            let missing = if config.token().as_deref().is_none_or(str::is_empty) {
                "Missing bot token. Please configure the bot token in setup."
            } else {
                "Missing application id. Please configure the client id in setup."
            };
            return Err(ConfigError::new(missing).into());
        };

        self.set_state(connecting);

        let commands = Arc::new(
            CommandRegistry::load(&self.options.commands_dir, &self.options.catalog).await,
        );
        let connection = self
            .connector
            .login(&LoginSettings::new(token, application_id))
            .await
            .inspect_err(|e| error!(error = %e, "Failed to log in to the gateway"))?;

        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let handle = SessionHandle::new(id, connection.session);
        let pump = self.spawn_pump(id, connection.events, Arc::clone(&commands));
        lifecycle.active = Some(ActiveSession {
            handle: handle.clone(),
            pump,
        });
        *self.current.lock() = Some(SessionSummary {
            id,
            command_count: commands.len(),
        });
        info!(session = id, commands = commands.len(), "Session opened");

        let target = match config.registration_guild() {
            Some(guild) => RegistrationTarget::Guild(guild.to_string()),
            None => RegistrationTarget::Global,
        };
        let registered = register(&commands, connection.registrar.as_ref(), &target).await;
        Ok((handle, registered))
    }

    async fn resolve_config(&self) -> HeraldResult<RuntimeConfig> {
        let Some(store) = &self.options.store else {
            return Ok(self.config());
        };
        let fallback = self.binder.read().fallback().clone();
        let record = ensure_config(store.as_ref(), &fallback).await?;
        Ok(self.binder.write().apply(&record).clone())
    }

    /// Abort the event pump and destroy the session, if any.
    async fn teardown(&self, lifecycle: &mut Lifecycle) {
        *self.current.lock() = None;
        if let Some(active) = lifecycle.active.take() {
            active.pump.abort();
            active.handle.session().destroy().await;
            debug!(session = active.handle.id(), "Session destroyed");
        }
    }

    fn cancel_recovery(&self) {
        let mut recovery = self.recovery.lock();
        if let Some(pending) = recovery.pending.take() {
            pending.abort();
            debug!("Pending recovery cancelled");
        }
        recovery.attempts = 0;
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            info!(from = %previous, to = %next, "Connection state changed");
        }
    }

    fn spawn_pump(
        &self,
        session_id: u64,
        mut events: mpsc::UnboundedReceiver<GatewayEvent>,
        commands: Arc<CommandRegistry>,
    ) -> JoinHandle<()> {
        let me = self.me.clone();
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    GatewayEvent::Ready { bot_name } => {
                        let Some(supervisor) = me.upgrade() else { break };
                        supervisor.on_ready(session_id, &bot_name).await;
                    }
                    GatewayEvent::Disconnected { reason } => {
                        let Some(supervisor) = me.upgrade() else { break };
                        supervisor.on_disconnect(session_id, &reason).await;
                    }
                    GatewayEvent::Error(message) => {
                        error!(session = session_id, %message, "Client error");
                    }
                    GatewayEvent::Interaction(interaction) => {
                        let dispatcher = dispatcher.clone();
                        let commands = Arc::clone(&commands);
                        tokio::spawn(async move {
                            dispatcher.dispatch(commands, interaction).await;
                        });
                    }
                }
            }
            debug!(session = session_id, "Event stream closed");
        })
    }

    #[instrument(skip(self))]
    async fn on_ready(&self, session_id: u64, bot_name: &str) {
        let lifecycle = self.lifecycle.lock().await;
        let Some(active) = lifecycle
            .active
            .as_ref()
            .filter(|active| active.handle.id() == session_id)
        else {
            debug!("Ready from a stale session, ignoring");
            return;
        };

        self.recovery.lock().attempts = 0;
        self.set_state(ConnectionState::Running);
        info!("Bot logged in");

        let session = active.handle.session();
        let presence = self.binder.read().effective().presence();
        let text = expand(presence.text(), &session.snapshot());
        if let Err(e) = session.set_presence(&presence.with_text(text)).await {
            warn!(error = %e, "Failed to push presence");
        }
    }

    #[instrument(skip(self))]
    async fn on_disconnect(&self, session_id: u64, reason: &str) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle
            .active
            .as_ref()
            .is_none_or(|active| active.handle.id() != session_id)
        {
            debug!("Disconnect from a stale session, ignoring");
            return;
        }
        if self.recovery.lock().pending.is_some() {
            debug!("Recovery already pending");
            return;
        }
        warn!("Bot disconnected, attempting auto-restart");
        self.schedule_recovery(&mut lifecycle).await;
    }

    /// Schedule the next recovery attempt, or give up after the last one.
    async fn schedule_recovery(&self, lifecycle: &mut Lifecycle) {
        let attempt = {
            let mut recovery = self.recovery.lock();
            if recovery.attempts >= MAX_RECOVERY_ATTEMPTS {
                None
            } else {
                recovery.attempts += 1;
                Some(recovery.attempts)
            }
        };

        let Some(attempt) = attempt else {
            error!(
                max_attempts = MAX_RECOVERY_ATTEMPTS,
                "Recovery exhausted, manual restart required"
            );
            self.set_state(ConnectionState::Stopped);
            *self.current.lock() = None;
            // May run on the session's own event pump; abort it last.
            if let Some(active) = lifecycle.active.take() {
                active.handle.session().destroy().await;
                active.pump.abort();
            }
            return;
        };

        let delay = recovery_delay(attempt);
        self.set_state(ConnectionState::Restarting);
        info!(
            attempt,
            max_attempts = MAX_RECOVERY_ATTEMPTS,
            delay_ms = delay.as_millis() as u64,
            "Auto-restart scheduled"
        );

        let me = self.me.clone();
        let pending = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(supervisor) = me.upgrade() {
                supervisor.recover(attempt).await;
            }
        });
        if let Some(previous) = self.recovery.lock().pending.replace(pending) {
            previous.abort();
        }
    }

    /// One recovery attempt. Boxed because it re-enters the scheduler.
    fn recover(self: Arc<Self>, attempt: u32) -> BoxFuture<'static, ()> {
        Box::pin(
            async move { self.recover_inner(attempt).await }
                .instrument(tracing::info_span!("recover", attempt)),
        )
    }

    async fn recover_inner(&self, attempt: u32) {
        let mut lifecycle = self.lifecycle.lock().await;
        // Detach our own handle so scheduling the next attempt cannot abort us.
        self.recovery.lock().pending.take();
        if self.state() != ConnectionState::Restarting {
            debug!("No longer restarting, recovery skipped");
            return;
        }

        self.teardown(&mut lifecycle).await;
        match self.connect(&mut lifecycle, ConnectionState::Restarting).await {
            Ok((handle, registered)) => {
                info!(session = handle.id(), "Recovery session opened");
                if let Err(e) = registered {
                    error!(error = %e, "Command registration failed after recovery");
                }
            }
            Err(e) => {
                error!(error = %e, "Auto-restart failed");
                self.schedule_recovery(&mut lifecycle).await;
            }
        }
    }
}

async fn register(
    commands: &CommandRegistry,
    registrar: &dyn CommandRegistrar,
    target: &RegistrationTarget,
) -> Result<usize, RegistrationError> {
    commands
        .register(registrar, target)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to register commands"))
}

impl std::fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("state", &self.state())
            .field("commands_dir", &self.options.commands_dir)
            .finish()
    }
}
