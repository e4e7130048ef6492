//! Serenity-backed gateway client.

use crate::{
    GatewayConnection, GatewayConnector, GatewayEvent, GatewaySession, LoginSettings,
    PresenceSnapshot, ProfileEdit,
};
use async_trait::async_trait;
use herald_commands::{
    CommandPayload, CommandRegistrar, Interaction, InteractionResponder, RegistrationTarget, Reply,
};
use herald_config::{ActivityKind, PresenceSpec, PresenceStatus};
use herald_error::{ConnectionError, GatewayError, HandlerError, HandlerResult, RegistrationError};
use parking_lot::{Mutex, RwLock};
use serde_json::{Value as JsonValue, json};
use serenity::all::{
    ActivityData, ActivityType, ApplicationId, Client, CommandDataOptionValue, CommandInteraction,
    Context, CreateAttachment, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse, EditProfile, EventHandler,
    GatewayIntents, Guild, GuildId, Http, Interaction as SerenityInteraction, OnlineStatus, Ready,
    ShardManager, UnavailableGuild,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Opens sessions against the Discord gateway.
#[derive(Debug, Clone)]
pub struct DiscordConnector {
    intents: GatewayIntents,
}

impl Default for DiscordConnector {
    fn default() -> Self {
        Self {
            intents: GatewayIntents::GUILDS,
        }
    }
}

impl DiscordConnector {
    /// Connector requesting only the guilds intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request additional gateway intents.
    pub fn with_intents(mut self, intents: GatewayIntents) -> Self {
        self.intents |= intents;
        self
    }
}

#[async_trait]
impl GatewayConnector for DiscordConnector {
    #[instrument(skip(self, settings), fields(application_id = %settings.application_id()))]
    async fn login(&self, settings: &LoginSettings) -> Result<GatewayConnection, ConnectionError> {
        let application_id = settings
            .application_id()
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .map(ApplicationId::new)
            .ok_or_else(|| {
                ConnectionError::new(format!(
                    "Invalid application id '{}'",
                    settings.application_id()
                ))
            })?;

        let (events_tx, events) = mpsc::unbounded_channel();
        let state = Arc::new(SessionState::default());
        let forwarder = Forwarder {
            events: events_tx.clone(),
            state: Arc::clone(&state),
        };

        let mut client = Client::builder(settings.token(), self.intents)
            .event_handler(forwarder)
            .await
            .map_err(|e| ConnectionError::new(format!("Failed to create Discord client: {e}")))?;
        client.http.set_application_id(application_id);

        let current = client.http.get_current_user().await.map_err(|e| {
            ConnectionError::new(format!(
                "Discord login failed: {e}. Please check your bot token."
            ))
        })?;
        *state.bot_name.write() = current.name.clone();
        info!(bot = %current.name, "Logged in to Discord");

        let http = Arc::clone(&client.http);
        let shard_manager = Arc::clone(&client.shard_manager);
        let runner_state = Arc::clone(&state);
        let runner = tokio::spawn(async move {
            let reason = match client.start().await {
                Ok(()) => "client stopped".to_string(),
                Err(e) => e.to_string(),
            };
            if !runner_state.destroyed.load(Ordering::Acquire) {
                let _ = events_tx.send(GatewayEvent::Disconnected { reason });
            }
        });

        let session = DiscordSession {
            http: Arc::clone(&http),
            shard_manager,
            state,
            runner: Mutex::new(Some(runner)),
        };
        Ok(GatewayConnection {
            session: Arc::new(session),
            registrar: Arc::new(DiscordRegistrar { http }),
            events,
        })
    }
}

#[derive(Default)]
struct SessionState {
    bot_name: RwLock<String>,
    /// Guild id -> (name, member count)
    guilds: RwLock<BTreeMap<GuildId, (String, u64)>>,
    context: Mutex<Option<Context>>,
    destroyed: AtomicBool,
}

struct DiscordSession {
    http: Arc<Http>,
    shard_manager: Arc<ShardManager>,
    state: Arc<SessionState>,
    runner: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl GatewaySession for DiscordSession {
    async fn destroy(&self) {
        self.state.destroyed.store(true, Ordering::Release);
        self.shard_manager.shutdown_all().await;
        if let Some(runner) = self.runner.lock().take() {
            runner.abort();
        }
        debug!("Discord client shut down");
    }

    async fn set_presence(&self, presence: &PresenceSpec) -> Result<(), GatewayError> {
        let context = self.state.context.lock().clone();
        let Some(context) = context else {
            return Err(GatewayError::new("Session is not ready, presence not sent"));
        };
        context.set_presence(Some(activity(presence)), online_status(*presence.status()));
        Ok(())
    }

    async fn edit_profile(&self, edit: &ProfileEdit) -> Result<(), GatewayError> {
        if edit.username.is_some() || edit.avatar.is_some() {
            let mut builder = EditProfile::new();
            if let Some(username) = &edit.username {
                builder = builder.username(username.clone());
            }
            if let Some(avatar) = &edit.avatar {
                let attachment = CreateAttachment::url(&self.http, avatar.as_str())
                    .await
                    .map_err(|e| GatewayError::new(format!("Failed to fetch avatar: {e}")))?;
                builder = builder.avatar(&attachment);
            }
            let mut user = self
                .http
                .get_current_user()
                .await
                .map_err(|e| GatewayError::new(e.to_string()))?;
            user.edit(&self.http, builder)
                .await
                .map_err(|e| GatewayError::new(format!("Failed to edit profile: {e}")))?;
        }
        if let Some(bio) = &edit.bio {
            self.http
                .edit_profile(&json!({ "bio": bio }))
                .await
                .map_err(|e| GatewayError::new(format!("Failed to edit bio: {e}")))?;
        }
        Ok(())
    }

    fn snapshot(&self) -> PresenceSnapshot {
        let guilds = self.state.guilds.read();
        let members = guilds.values().map(|(_, count)| *count).sum();
        PresenceSnapshot::new(
            members,
            guilds.len() as u64,
            members,
            self.state.bot_name.read().clone(),
            guilds.values().next().map(|(name, _)| name.clone()),
        )
    }
}

fn activity(presence: &PresenceSpec) -> ActivityData {
    let text = presence.text().clone();
    match presence.kind() {
        ActivityKind::Playing => ActivityData::playing(text),
        ActivityKind::Listening => ActivityData::listening(text),
        ActivityKind::Watching => ActivityData::watching(text),
        ActivityKind::Custom => ActivityData::custom(text),
        ActivityKind::Competing => ActivityData::competing(text),
        ActivityKind::Streaming => {
            let mut activity = ActivityData::playing(text);
            activity.kind = ActivityType::Streaming;
            activity
        }
    }
}

fn online_status(status: PresenceStatus) -> OnlineStatus {
    match status {
        PresenceStatus::Online => OnlineStatus::Online,
        PresenceStatus::Idle => OnlineStatus::Idle,
        PresenceStatus::Dnd => OnlineStatus::DoNotDisturb,
        PresenceStatus::Invisible => OnlineStatus::Invisible,
    }
}

struct DiscordRegistrar {
    http: Arc<Http>,
}

#[async_trait]
impl CommandRegistrar for DiscordRegistrar {
    async fn replace_all(
        &self,
        target: &RegistrationTarget,
        commands: &[CommandPayload],
    ) -> Result<(), RegistrationError> {
        let result = match target {
            RegistrationTarget::Global => self.http.create_global_commands(&commands).await,
            RegistrationTarget::Guild(guild) => {
                let guild_id = guild
                    .parse::<u64>()
                    .ok()
                    .filter(|id| *id != 0)
                    .map(GuildId::new)
                    .ok_or_else(|| {
                        RegistrationError::new(
                            format!("Invalid guild id '{guild}'"),
                            commands.len(),
                        )
                    })?;
                self.http.create_guild_commands(guild_id, &commands).await
            }
        };
        result
            .map(|_| ())
            .map_err(|e| RegistrationError::new(e.to_string(), commands.len()))
    }
}

/// Forwards serenity events into the session's event channel.
struct Forwarder {
    events: mpsc::UnboundedSender<GatewayEvent>,
    state: Arc<SessionState>,
}

#[async_trait]
impl EventHandler for Forwarder {
    async fn ready(&self, ctx: Context, ready: Ready) {
        *self.state.context.lock() = Some(ctx);
        *self.state.bot_name.write() = ready.user.name.clone();
        let _ = self.events.send(GatewayEvent::Ready {
            bot_name: ready.user.name.clone(),
        });
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        self.state
            .guilds
            .write()
            .insert(guild.id, (guild.name, guild.member_count));
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        self.state.guilds.write().remove(&incomplete.id);
    }

    async fn interaction_create(&self, ctx: Context, interaction: SerenityInteraction) {
        let SerenityInteraction::Command(command) = interaction else {
            return;
        };
        let options = option_values(&command);
        let user = command.user.name.clone();
        let name = command.data.name.clone();
        let responder = SerenityResponder {
            http: Arc::clone(&ctx.http),
            command,
        };
        let interaction = Interaction::new(name, options, Box::new(responder)).with_user(user);
        if self.events.send(GatewayEvent::Interaction(interaction)).is_err() {
            warn!("Event stream closed, interaction dropped");
        }
    }
}

fn option_values(command: &CommandInteraction) -> HashMap<String, JsonValue> {
    command
        .data
        .options
        .iter()
        .filter_map(|option| {
            let value = match &option.value {
                CommandDataOptionValue::String(value) => json!(value),
                CommandDataOptionValue::Integer(value) => json!(value),
                CommandDataOptionValue::Number(value) => json!(value),
                CommandDataOptionValue::Boolean(value) => json!(value),
                CommandDataOptionValue::User(id) => json!(id.to_string()),
                CommandDataOptionValue::Channel(id) => json!(id.to_string()),
                CommandDataOptionValue::Role(id) => json!(id.to_string()),
                CommandDataOptionValue::Mentionable(id) => json!(id.to_string()),
                CommandDataOptionValue::Attachment(id) => json!(id.to_string()),
                _ => return None,
            };
            Some((option.name.clone(), value))
        })
        .collect()
}

struct SerenityResponder {
    http: Arc<Http>,
    command: CommandInteraction,
}

#[async_trait]
impl InteractionResponder for SerenityResponder {
    async fn reply(&self, reply: &Reply) -> HandlerResult<()> {
        let message = CreateInteractionResponseMessage::new()
            .content(reply.content.clone())
            .ephemeral(reply.ephemeral);
        self.command
            .create_response(&self.http, CreateInteractionResponse::Message(message))
            .await
            .map_err(|e| HandlerError::respond(e.to_string()))
    }

    async fn defer(&self, ephemeral: bool) -> HandlerResult<()> {
        let message = CreateInteractionResponseMessage::new().ephemeral(ephemeral);
        self.command
            .create_response(&self.http, CreateInteractionResponse::Defer(message))
            .await
            .map_err(|e| HandlerError::respond(e.to_string()))
    }

    async fn follow_up(&self, reply: &Reply) -> HandlerResult<()> {
        let followup = CreateInteractionResponseFollowup::new()
            .content(reply.content.clone())
            .ephemeral(reply.ephemeral);
        self.command
            .create_followup(&self.http, followup)
            .await
            .map(|_| ())
            .map_err(|e| HandlerError::respond(e.to_string()))
    }

    async fn edit_reply(&self, content: &str) -> HandlerResult<()> {
        self.command
            .edit_response(&self.http, EditInteractionResponse::new().content(content))
            .await
            .map(|_| ())
            .map_err(|e| HandlerError::respond(e.to_string()))
    }
}
