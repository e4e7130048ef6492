//! Inbound command invocations and their response state.

use async_trait::async_trait;
use herald_error::{HandlerError, HandlerErrorKind, HandlerResult};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Notify;

/// A message sent in response to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message text
    pub content: String,
    /// Visible only to the invoking user
    pub ephemeral: bool,
}

impl Reply {
    /// Reply only the invoking user can see.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }

    /// Reply visible to the whole channel.
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }
}

/// Platform side of an interaction: the calls that actually send responses.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    /// Send the initial response.
    async fn reply(&self, reply: &Reply) -> HandlerResult<()>;

    /// Acknowledge now, respond later.
    async fn defer(&self, ephemeral: bool) -> HandlerResult<()>;

    /// Send an additional message after the initial response.
    async fn follow_up(&self, reply: &Reply) -> HandlerResult<()>;

    /// Replace the content of the initial response.
    async fn edit_reply(&self, content: &str) -> HandlerResult<()>;
}

/// How far the interaction has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseState {
    /// Nothing sent yet
    Pending,
    /// Acknowledged with a deferred response
    Deferred,
    /// Initial response sent
    Replied,
    /// Initial response (reply or defer) in flight
    Responding,
}

impl ResponseState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Deferred,
            2 => Self::Replied,
            3 => Self::Responding,
            _ => Self::Pending,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Deferred => 1,
            Self::Replied => 2,
            Self::Responding => 3,
        }
    }
}

/// One command invocation, as handed to a handler.
///
/// Wraps the platform responder and tracks whether an initial response
/// has gone out, so that only one is ever sent. Sending the initial response
/// is claimed atomically: of two concurrent `reply`/`defer` calls exactly one
/// reaches the platform.
pub struct Interaction {
    command: String,
    options: HashMap<String, JsonValue>,
    user: Option<String>,
    responder: Box<dyn InteractionResponder>,
    state: AtomicU8,
    settled: Notify,
}

impl Interaction {
    /// Wrap a platform invocation.
    pub fn new(
        command: impl Into<String>,
        options: HashMap<String, JsonValue>,
        responder: Box<dyn InteractionResponder>,
    ) -> Self {
        Self {
            command: command.into(),
            options,
            user: None,
            responder,
            state: AtomicU8::new(ResponseState::Pending.as_u8()),
            settled: Notify::new(),
        }
    }

    /// Attach the invoking user's display name, used for logging.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Invoked command name.
    pub fn command_name(&self) -> &str {
        &self.command
    }

    /// Invoking user, if known.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Raw option value.
    pub fn option(&self, name: &str) -> Option<&JsonValue> {
        self.options.get(name)
    }

    /// String option value.
    pub fn string_option(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(JsonValue::as_str)
    }

    /// Integer option value.
    pub fn integer_option(&self, name: &str) -> Option<i64> {
        self.option(name).and_then(JsonValue::as_i64)
    }

    /// Boolean option value.
    pub fn boolean_option(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(JsonValue::as_bool)
    }

    /// Current response state.
    pub fn state(&self) -> ResponseState {
        ResponseState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether an initial response (reply or defer) has been sent or is
    /// being sent.
    pub fn is_acknowledged(&self) -> bool {
        self.state() != ResponseState::Pending
    }

    /// Wait until no initial response is in flight and return the state.
    pub async fn settled(&self) -> ResponseState {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let state = self.state();
            if state != ResponseState::Responding {
                return state;
            }
            notified.await;
        }
    }

    /// Send the initial response.
    ///
    /// # Errors
    ///
    /// Fails with [`HandlerErrorKind::AlreadyAcknowledged`] if an initial
    /// response was already sent or is being sent.
    pub async fn reply(&self, reply: Reply) -> HandlerResult<()> {
        let claim = self.claim()?;
        self.responder.reply(&reply).await?;
        claim.commit(ResponseState::Replied);
        Ok(())
    }

    /// Acknowledge the interaction and respond later.
    pub async fn defer(&self, ephemeral: bool) -> HandlerResult<()> {
        let claim = self.claim()?;
        self.responder.defer(ephemeral).await?;
        claim.commit(ResponseState::Deferred);
        Ok(())
    }

    /// Send an additional message; the interaction must be acknowledged.
    ///
    /// Waits for an in-flight initial response to land first.
    pub async fn follow_up(&self, reply: Reply) -> HandlerResult<()> {
        if self.settled().await == ResponseState::Pending {
            return Err(HandlerError::respond(
                "follow-up requires an initial response",
            ));
        }
        self.responder.follow_up(&reply).await
    }

    /// Replace the content of the initial (or deferred) response.
    pub async fn edit_reply(&self, content: impl AsRef<str>) -> HandlerResult<()> {
        if self.settled().await == ResponseState::Pending {
            return Err(HandlerError::respond("nothing to edit yet"));
        }
        self.responder.edit_reply(content.as_ref()).await?;
        self.state
            .store(ResponseState::Replied.as_u8(), Ordering::Release);
        Ok(())
    }

    /// Move `Pending -> Responding`, or fail if someone else got there first.
    fn claim(&self) -> HandlerResult<ResponseClaim<'_>> {
        self.state
            .compare_exchange(
                ResponseState::Pending.as_u8(),
                ResponseState::Responding.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| HandlerError::new(HandlerErrorKind::AlreadyAcknowledged))?;
        Ok(ResponseClaim {
            interaction: self,
            committed: false,
        })
    }

    fn settle(&self, state: ResponseState) {
        self.state.store(state.as_u8(), Ordering::Release);
        self.settled.notify_waiters();
    }
}

/// Exclusive right to send the initial response.
///
/// Dropped without [`ResponseClaim::commit`] (send failed or the future was
/// cancelled) it hands the interaction back to `Pending`.
struct ResponseClaim<'a> {
    interaction: &'a Interaction,
    committed: bool,
}

impl ResponseClaim<'_> {
    fn commit(mut self, state: ResponseState) {
        self.committed = true;
        self.interaction.settle(state);
    }
}

impl Drop for ResponseClaim<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.interaction.settle(ResponseState::Pending);
        }
    }
}

impl std::fmt::Debug for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interaction")
            .field("command", &self.command)
            .field("options", &self.options)
            .field("user", &self.user)
            .field("state", &self.state())
            .finish()
    }
}
