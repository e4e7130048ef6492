//! Tests for manifest discovery and remote registration.

use async_trait::async_trait;
use herald_commands::{
    CommandPayload, CommandRegistrar, CommandRegistry, HandlerCatalog, RegistrationTarget,
};
use herald_error::RegistrationError;
use parking_lot::Mutex;
use std::path::Path;

const PING: &str = r#"
name = "ping"
description = "Check bot and API latency"
handler = "ping"
"#;

const ROLL: &str = r#"
name = "roll"
description = "Roll a dice"
handler = "roll"

[[options]]
name = "sides"
description = "Number of sides on the die (2-1000)"
kind = "integer"
min_value = 2
max_value = 1000
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().expect("manifest has a parent"))
        .expect("Failed to create directory");
    std::fs::write(path, content).expect("Failed to write manifest");
}

#[derive(Default)]
struct RecordingRegistrar {
    calls: Mutex<Vec<(RegistrationTarget, Vec<CommandPayload>)>>,
    fail: bool,
}

#[async_trait]
impl CommandRegistrar for RecordingRegistrar {
    async fn replace_all(
        &self,
        target: &RegistrationTarget,
        commands: &[CommandPayload],
    ) -> Result<(), RegistrationError> {
        self.calls.lock().push((target.clone(), commands.to_vec()));
        if self.fail {
            return Err(RegistrationError::new("rejected", commands.len()));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_malformed_manifest_is_skipped() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "utility/ping.toml", PING);
    write(dir.path(), "fun/roll.toml", ROLL);
    write(dir.path(), "fun/broken.toml", "name = \"broken\"\ndescription = ");

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert_eq!(registry.len(), 2);
    assert!(registry.get("ping").is_some());
    assert!(registry.get("roll").is_some());
    assert!(registry.get("broken").is_none());
}

#[tokio::test]
async fn test_missing_fields_and_unknown_handler_are_skipped() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "ping.toml", PING);
    write(dir.path(), "nodesc.toml", "name = \"nodesc\"\nhandler = \"ping\"\n");
    write(
        dir.path(),
        "ghost.toml",
        "name = \"ghost\"\ndescription = \"Nothing behind it\"\nhandler = \"ghost\"\n",
    );
    write(
        dir.path(),
        "Upper.toml",
        "name = \"Upper\"\ndescription = \"Bad name\"\nhandler = \"ping\"\n",
    );

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["ping"]);
}

#[tokio::test]
async fn test_first_loaded_duplicate_wins() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(
        dir.path(),
        "a/ping.toml",
        "name = \"ping\"\ndescription = \"First\"\nhandler = \"ping\"\n",
    );
    write(
        dir.path(),
        "b/ping.toml",
        "name = \"ping\"\ndescription = \"Second\"\nhandler = \"ping\"\n",
    );

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert_eq!(registry.len(), 1);
    let ping = registry.get("ping").expect("ping should be loaded");
    assert_eq!(ping.description(), "First");
}

#[tokio::test]
async fn test_non_toml_files_are_ignored() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "ping.toml", PING);
    write(dir.path(), "README.md", "# Commands");
    write(dir.path(), "deep/nested/tree/roll.toml", ROLL);

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["ping", "roll"]);
}

#[tokio::test]
async fn test_missing_directory_yields_empty_registry() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let registry =
        CommandRegistry::load(dir.path().join("absent"), &HandlerCatalog::with_builtins()).await;

    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_payload_matches_platform_shape() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "roll.toml", ROLL);

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;
    let payload = serde_json::to_value(registry.payload()).expect("Failed to serialize");

    assert_eq!(
        payload,
        serde_json::json!([{
            "name": "roll",
            "description": "Roll a dice",
            "type": 1,
            "options": [{
                "type": 4,
                "name": "sides",
                "description": "Number of sides on the die (2-1000)",
                "required": false,
                "min_value": 2.0,
                "max_value": 1000.0
            }]
        }])
    );
}

#[tokio::test]
async fn test_register_empty_registry_is_noop() {
    let registrar = RecordingRegistrar::default();

    let count = CommandRegistry::new()
        .register(&registrar, &RegistrationTarget::Global)
        .await
        .expect("Empty registration should succeed");

    assert_eq!(count, 0);
    assert!(registrar.calls.lock().is_empty());
}

#[tokio::test]
async fn test_register_submits_single_replace_all() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "ping.toml", PING);
    write(dir.path(), "roll.toml", ROLL);
    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;
    let registrar = RecordingRegistrar::default();
    let target = RegistrationTarget::Guild("42".to_string());

    let count = registry
        .register(&registrar, &target)
        .await
        .expect("Registration should succeed");

    assert_eq!(count, 2);
    let calls = registrar.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, target);
    assert_eq!(calls[0].1.len(), 2);
}

#[tokio::test]
async fn test_register_failure_is_surfaced() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "ping.toml", PING);
    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;
    let registrar = RecordingRegistrar {
        fail: true,
        ..Default::default()
    };

    let err = registry
        .register(&registrar, &RegistrationTarget::Global)
        .await
        .expect_err("Registration should fail");

    assert_eq!(err.command_count, 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_directory_is_walked() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let shared = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "ping.toml", PING);
    write(shared.path(), "fun/roll.toml", ROLL);
    std::os::unix::fs::symlink(shared.path().join("fun"), dir.path().join("fun"))
        .expect("Failed to create symlink");

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["ping", "roll"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_manifest_is_loaded() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let shared = tempfile::tempdir().expect("Failed to create temp dir");
    write(shared.path(), "roll.toml", ROLL);
    std::os::unix::fs::symlink(shared.path().join("roll.toml"), dir.path().join("roll.toml"))
        .expect("Failed to create symlink");

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert!(registry.get("roll").is_some());
}

#[cfg(unix)]
#[tokio::test]
async fn test_dangling_symlink_does_not_abort_walk() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "a/ping.toml", PING);
    write(dir.path(), "z/roll.toml", ROLL);
    std::fs::create_dir_all(dir.path().join("m")).expect("Failed to create directory");
    std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("m/gone.toml"))
        .expect("Failed to create symlink");
    std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("m/lost"))
        .expect("Failed to create symlink");

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["ping", "roll"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_loop_is_walked_once() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write(dir.path(), "fun/roll.toml", ROLL);
    std::os::unix::fs::symlink(dir.path(), dir.path().join("fun/back"))
        .expect("Failed to create symlink");

    let registry = CommandRegistry::load(dir.path(), &HandlerCatalog::with_builtins()).await;

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["roll"]);
}
