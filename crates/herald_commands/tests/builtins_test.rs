//! Tests for the bundled command handlers.

use async_trait::async_trait;
use herald_commands::builtins::{DEFAULT_SIDES, format_duration, parse_choices};
use herald_commands::{
    CommandContext, CommandRegistry, HandlerCatalog, Interaction, InteractionResponder, Reply,
};
use herald_error::{HandlerErrorKind, HandlerResult};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct Transcript {
    messages: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl InteractionResponder for Transcript {
    async fn reply(&self, reply: &Reply) -> HandlerResult<()> {
        self.messages.lock().push(reply.content.clone());
        Ok(())
    }

    async fn defer(&self, _ephemeral: bool) -> HandlerResult<()> {
        Ok(())
    }

    async fn follow_up(&self, reply: &Reply) -> HandlerResult<()> {
        self.messages.lock().push(reply.content.clone());
        Ok(())
    }

    async fn edit_reply(&self, content: &str) -> HandlerResult<()> {
        self.messages.lock().push(content.to_string());
        Ok(())
    }
}

async fn run(
    command: &str,
    options: HashMap<String, serde_json::Value>,
    commands: CommandRegistry,
) -> (HandlerResult<()>, Vec<String>) {
    let transcript = Transcript::default();
    let handler = HandlerCatalog::with_builtins()
        .get(command)
        .expect("Builtin should exist");
    let interaction = Arc::new(Interaction::new(
        command,
        options,
        Box::new(transcript.clone()),
    ));
    let ctx = CommandContext::new(interaction, Arc::new(commands), Instant::now());
    let result = handler.execute(ctx).await;
    (result, transcript.messages())
}

fn shipped_commands_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../commands")
}

#[test]
fn test_catalog_contains_builtins() {
    let catalog = HandlerCatalog::with_builtins();
    assert_eq!(
        catalog.names(),
        vec!["choose", "coinflip", "help", "ping", "roll", "uptime"]
    );
}

#[test]
fn test_parse_choices_splits_on_commas_and_pipes() {
    assert_eq!(parse_choices("a, b | c,,  "), vec!["a", "b", "c"]);
    assert!(parse_choices(" , | ").is_empty());
}

#[test]
fn test_format_duration() {
    assert_eq!(format_duration(Duration::from_secs(0)), "0s");
    assert_eq!(format_duration(Duration::from_secs(61)), "1m 1s");
    assert_eq!(format_duration(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    assert_eq!(format_duration(Duration::from_secs(3_600)), "1h 0s");
}

#[tokio::test]
async fn test_ping_replies_then_edits() {
    let (result, messages) = run("ping", HashMap::new(), CommandRegistry::new()).await;

    result.expect("ping should succeed");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], "Pinging...");
    assert!(messages[1].starts_with("Pong!"));
}

#[tokio::test]
async fn test_coinflip_lands_on_a_side() {
    let (result, messages) = run("coinflip", HashMap::new(), CommandRegistry::new()).await;

    result.expect("coinflip should succeed");
    assert!(messages[0].contains("Heads") || messages[0].contains("Tails"));
}

#[tokio::test]
async fn test_roll_defaults_to_six_sides() {
    let (result, messages) = run("roll", HashMap::new(), CommandRegistry::new()).await;

    result.expect("roll should succeed");
    assert!(messages[0].contains(&format!("{DEFAULT_SIDES}-sided")));
}

#[tokio::test]
async fn test_roll_rejects_out_of_range_sides() {
    let options = HashMap::from([("sides".to_string(), json!(1))]);
    let (result, messages) = run("roll", options, CommandRegistry::new()).await;

    let err = result.expect_err("one-sided die should be rejected");
    assert!(matches!(err.kind, HandlerErrorKind::InvalidOption { .. }));
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_choose_picks_one_option() {
    let options = HashMap::from([
        ("options".to_string(), json!("tea|coffee")),
        ("question".to_string(), json!("Drink?")),
    ]);
    let (result, messages) = run("choose", options, CommandRegistry::new()).await;

    result.expect("choose should succeed");
    assert!(messages[0].starts_with("**Drink?**"));
    assert!(messages[0].contains("tea") || messages[0].contains("coffee"));
}

#[tokio::test]
async fn test_choose_needs_two_options() {
    let options = HashMap::from([("options".to_string(), json!("only"))]);
    let (result, messages) = run("choose", options, CommandRegistry::new()).await;

    result.expect("choose should answer with guidance");
    assert!(messages[0].contains("at least two"));
}

#[tokio::test]
async fn test_help_lists_loaded_commands() {
    let commands =
        CommandRegistry::load(shipped_commands_dir(), &HandlerCatalog::with_builtins()).await;
    let (result, messages) = run("help", HashMap::new(), commands).await;

    result.expect("help should succeed");
    for name in ["/choose", "/coinflip", "/help", "/ping", "/roll", "/uptime"] {
        assert!(messages[0].contains(name), "help output should list {name}");
    }
}

#[tokio::test]
async fn test_shipped_manifests_all_load() {
    let commands =
        CommandRegistry::load(shipped_commands_dir(), &HandlerCatalog::with_builtins()).await;
    assert_eq!(commands.len(), 6);
}
