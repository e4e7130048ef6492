//! Tests for interaction routing and failure isolation.

use async_trait::async_trait;
use herald_commands::{
    CommandContext, CommandDefinition, CommandHandler, CommandRegistry, DispatchOutcome,
    HANDLER_ERROR_MESSAGE, Interaction, InteractionDispatcher, InteractionResponder, Reply,
    ResponseState,
};
use herald_error::{HandlerError, HandlerErrorKind, HandlerResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Reply(Reply),
    Defer(bool),
    FollowUp(Reply),
    Edit(String),
}

#[derive(Clone, Default)]
struct RecordingResponder {
    sent: Arc<Mutex<Vec<Sent>>>,
    broken: bool,
    slow: bool,
}

impl RecordingResponder {
    fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    /// Responder that yields to the scheduler before each initial response.
    fn slow() -> Self {
        Self {
            slow: true,
            ..Default::default()
        }
    }

    fn initial_replies(&self) -> usize {
        self.sent()
            .iter()
            .filter(|sent| matches!(sent, Sent::Reply(_) | Sent::Defer(_)))
            .count()
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    fn record(&self, sent: Sent) -> HandlerResult<()> {
        if self.broken {
            return Err(HandlerError::respond("connection reset"));
        }
        self.sent.lock().push(sent);
        Ok(())
    }
}

#[async_trait]
impl InteractionResponder for RecordingResponder {
    async fn reply(&self, reply: &Reply) -> HandlerResult<()> {
        if self.slow {
            tokio::task::yield_now().await;
        }
        self.record(Sent::Reply(reply.clone()))
    }

    async fn defer(&self, ephemeral: bool) -> HandlerResult<()> {
        if self.slow {
            tokio::task::yield_now().await;
        }
        self.record(Sent::Defer(ephemeral))
    }

    async fn follow_up(&self, reply: &Reply) -> HandlerResult<()> {
        self.record(Sent::FollowUp(reply.clone()))
    }

    async fn edit_reply(&self, content: &str) -> HandlerResult<()> {
        self.record(Sent::Edit(content.to_string()))
    }
}

#[derive(Clone, Copy)]
enum Behavior {
    ReplyOk,
    FailBeforeReply,
    ReplyThenFail,
    DeferThenFail,
    BackgroundReplyThenFail,
    Panic,
}

struct ScriptedHandler {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
    background: Arc<Mutex<Option<JoinHandle<HandlerResult<()>>>>>,
}

#[async_trait]
impl CommandHandler for ScriptedHandler {
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = || {
            HandlerError::new(HandlerErrorKind::Failed {
                command: "test".to_string(),
                reason: "boom".to_string(),
            })
        };
        match self.behavior {
            Behavior::ReplyOk => ctx.interaction().reply(Reply::public("done")).await,
            Behavior::FailBeforeReply => Err(failure()),
            Behavior::ReplyThenFail => {
                ctx.interaction().reply(Reply::public("partial")).await?;
                Err(failure())
            }
            Behavior::DeferThenFail => {
                ctx.interaction().defer(true).await?;
                Err(failure())
            }
            Behavior::BackgroundReplyThenFail => {
                let background = ctx.clone();
                let task = tokio::spawn(async move {
                    background
                        .interaction()
                        .reply(Reply::public("background"))
                        .await
                });
                *self.background.lock() = Some(task);
                tokio::task::yield_now().await;
                Err(failure())
            }
            Behavior::Panic => panic!("handler exploded"),
        }
    }
}

fn registry_with(behavior: Behavior) -> (Arc<CommandRegistry>, Arc<AtomicUsize>) {
    let (registry, calls, _) = scripted_registry(behavior);
    (registry, calls)
}

type BackgroundSlot = Arc<Mutex<Option<JoinHandle<HandlerResult<()>>>>>;

fn scripted_registry(
    behavior: Behavior,
) -> (Arc<CommandRegistry>, Arc<AtomicUsize>, BackgroundSlot) {
    let calls = Arc::new(AtomicUsize::new(0));
    let background = BackgroundSlot::default();
    let handler = Arc::new(ScriptedHandler {
        behavior,
        calls: Arc::clone(&calls),
        background: Arc::clone(&background),
    });
    let definition = CommandDefinition::new("test", "A scripted command", "test", handler)
        .expect("Definition should be valid");
    let mut registry = CommandRegistry::new();
    registry.insert(definition).expect("Insert should succeed");
    (Arc::new(registry), calls, background)
}

fn interaction(command: &str, responder: &RecordingResponder) -> Interaction {
    Interaction::new(command, HashMap::new(), Box::new(responder.clone()))
}

#[tokio::test]
async fn test_unknown_command_is_ignored() {
    let (registry, calls) = registry_with(Behavior::ReplyOk);
    let responder = RecordingResponder::default();

    let outcome = InteractionDispatcher::new()
        .dispatch(registry, interaction("missing", &responder))
        .await;

    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(responder.sent().is_empty());
}

#[tokio::test]
async fn test_handler_invoked_exactly_once() {
    let (registry, calls) = registry_with(Behavior::ReplyOk);
    let responder = RecordingResponder::default();

    let outcome = InteractionDispatcher::new()
        .dispatch(registry, interaction("test", &responder))
        .await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(responder.sent(), vec![Sent::Reply(Reply::public("done"))]);
}

#[tokio::test]
async fn test_failure_before_reply_sends_ephemeral_reply() {
    let (registry, _) = registry_with(Behavior::FailBeforeReply);
    let responder = RecordingResponder::default();

    let outcome = InteractionDispatcher::new()
        .dispatch(registry, interaction("test", &responder))
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Failed {
            error_delivered: true
        }
    );
    assert_eq!(
        responder.sent(),
        vec![Sent::Reply(Reply::ephemeral(HANDLER_ERROR_MESSAGE))]
    );
}

#[tokio::test]
async fn test_failure_after_partial_reply_sends_follow_up() {
    let (registry, _) = registry_with(Behavior::ReplyThenFail);
    let responder = RecordingResponder::default();

    InteractionDispatcher::new()
        .dispatch(registry, interaction("test", &responder))
        .await;

    assert_eq!(
        responder.sent(),
        vec![
            Sent::Reply(Reply::public("partial")),
            Sent::FollowUp(Reply::ephemeral(HANDLER_ERROR_MESSAGE)),
        ]
    );
}

#[tokio::test]
async fn test_failure_after_defer_sends_follow_up() {
    let (registry, _) = registry_with(Behavior::DeferThenFail);
    let responder = RecordingResponder::default();

    InteractionDispatcher::new()
        .dispatch(registry, interaction("test", &responder))
        .await;

    assert_eq!(
        responder.sent(),
        vec![
            Sent::Defer(true),
            Sent::FollowUp(Reply::ephemeral(HANDLER_ERROR_MESSAGE)),
        ]
    );
}

#[tokio::test]
async fn test_panicking_handler_is_isolated() {
    let (registry, calls) = registry_with(Behavior::Panic);
    let responder = RecordingResponder::default();

    let outcome = InteractionDispatcher::new()
        .dispatch(registry, interaction("test", &responder))
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcome,
        DispatchOutcome::Failed {
            error_delivered: true
        }
    );
    assert_eq!(
        responder.sent(),
        vec![Sent::Reply(Reply::ephemeral(HANDLER_ERROR_MESSAGE))]
    );
}

#[tokio::test]
async fn test_undeliverable_error_message_is_swallowed() {
    let (registry, _) = registry_with(Behavior::FailBeforeReply);
    let responder = RecordingResponder::broken();

    let outcome = InteractionDispatcher::new()
        .dispatch(registry, interaction("test", &responder))
        .await;

    assert_eq!(
        outcome,
        DispatchOutcome::Failed {
            error_delivered: false
        }
    );
}

#[tokio::test]
async fn test_second_reply_is_rejected() {
    let responder = RecordingResponder::default();
    let interaction = interaction("test", &responder);

    interaction
        .reply(Reply::public("first"))
        .await
        .expect("First reply should succeed");
    let err = interaction
        .reply(Reply::public("second"))
        .await
        .expect_err("Second reply should fail");

    assert_eq!(err.kind, HandlerErrorKind::AlreadyAcknowledged);
    assert_eq!(responder.sent(), vec![Sent::Reply(Reply::public("first"))]);
}

#[tokio::test]
async fn test_concurrent_replies_send_one_initial_response() {
    let responder = RecordingResponder::slow();
    let interaction = interaction("test", &responder);

    let (first, second) = tokio::join!(
        interaction.reply(Reply::public("a")),
        interaction.reply(Reply::public("b")),
    );

    assert_eq!(responder.initial_replies(), 1);
    assert!(first.is_ok() != second.is_ok());
    let err = first.err().or(second.err()).expect("One reply should fail");
    assert_eq!(err.kind, HandlerErrorKind::AlreadyAcknowledged);
    assert_eq!(interaction.state(), ResponseState::Replied);
}

#[tokio::test]
async fn test_concurrent_reply_and_defer_send_one_initial_response() {
    let responder = RecordingResponder::slow();
    let interaction = interaction("test", &responder);

    let (replied, deferred) = tokio::join!(
        interaction.reply(Reply::public("a")),
        interaction.defer(true),
    );

    assert_eq!(responder.initial_replies(), 1);
    assert!(replied.is_ok() != deferred.is_ok());
}

#[tokio::test]
async fn test_failed_reply_releases_the_claim() {
    let broken = RecordingResponder::broken();
    let interaction = interaction("test", &broken);

    interaction
        .reply(Reply::public("lost"))
        .await
        .expect_err("Broken responder should fail");

    assert_eq!(interaction.state(), ResponseState::Pending);
}

#[tokio::test]
async fn test_failure_with_reply_in_flight_sends_single_initial_response() {
    let (registry, _, background) = scripted_registry(Behavior::BackgroundReplyThenFail);
    let responder = RecordingResponder::slow();

    let outcome = InteractionDispatcher::new()
        .dispatch(registry, interaction("test", &responder))
        .await;
    let task = background.lock().take().expect("Handler spawned a reply");
    let _ = task.await.expect("Background reply task should not panic");

    assert_eq!(
        outcome,
        DispatchOutcome::Failed {
            error_delivered: true
        }
    );
    assert_eq!(responder.initial_replies(), 1);
    assert!(
        responder
            .sent()
            .iter()
            .skip(1)
            .all(|sent| matches!(sent, Sent::FollowUp(_)))
    );
}
