//! Routes inbound invocations to their handlers.

use crate::{CommandContext, CommandRegistry, Interaction, Reply, ResponseState};
use herald_error::{HandlerError, HandlerErrorKind};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Message shown to the user when a handler fails.
pub const HANDLER_ERROR_MESSAGE: &str = "An error occurred while executing this command.";

/// What happened to one dispatched invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No command with that name is loaded
    Ignored,
    /// Handler ran to completion
    Completed,
    /// Handler failed or panicked
    Failed {
        /// Whether the error message reached the user
        error_delivered: bool,
    },
}

/// Invokes command handlers and turns their failures into one error reply.
#[derive(Debug, Clone)]
pub struct InteractionDispatcher {
    started_at: Instant,
}

impl Default for InteractionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionDispatcher {
    /// Dispatcher whose uptime origin is now.
    pub fn new() -> Self {
        Self::with_start(Instant::now())
    }

    /// Dispatcher with an explicit uptime origin.
    pub fn with_start(started_at: Instant) -> Self {
        Self { started_at }
    }

    /// Uptime origin handed to handlers.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Route `interaction` to its handler.
    ///
    /// The handler runs in its own task. Failures never escape this call:
    /// they are logged and reported to the user as an ephemeral message.
    #[instrument(skip_all, fields(command = %interaction.command_name(), user = ?interaction.user()))]
    pub async fn dispatch(
        &self,
        commands: Arc<CommandRegistry>,
        interaction: Interaction,
    ) -> DispatchOutcome {
        let Some(definition) = commands.get(interaction.command_name()) else {
            debug!("No handler for command, ignoring");
            return DispatchOutcome::Ignored;
        };
        let handler = Arc::clone(definition.handler());
        let command = interaction.command_name().to_string();
        let interaction = Arc::new(interaction);
        let ctx = CommandContext::new(Arc::clone(&interaction), commands, self.started_at);

        let result = match tokio::spawn(async move { handler.execute(ctx).await }).await {
            Ok(result) => result,
            Err(join_error) => Err(HandlerError::new(HandlerErrorKind::Aborted {
                command: command.clone(),
                reason: join_error.to_string(),
            })),
        };

        match result {
            Ok(()) => {
                info!("Command executed");
                DispatchOutcome::Completed
            }
            Err(e) => {
                error!(error = %e, "Command handler failed");
                let error_delivered = report_failure(&interaction).await;
                DispatchOutcome::Failed { error_delivered }
            }
        }
    }
}

/// Send the error message: a follow-up once anything was sent, otherwise the
/// initial reply. A reply still in flight from the handler (e.g. a spawned
/// task holding a clone of its context) is waited for.
async fn report_failure(interaction: &Interaction) -> bool {
    let reply = Reply::ephemeral(HANDLER_ERROR_MESSAGE);
    let sent = match interaction.settled().await {
        ResponseState::Pending => match interaction.reply(reply.clone()).await {
            Err(e) if e.kind == HandlerErrorKind::AlreadyAcknowledged => {
                interaction.follow_up(reply).await
            }
            sent => sent,
        },
        _ => interaction.follow_up(reply).await,
    };
    match sent {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to deliver error message");
            false
        }
    }
}
