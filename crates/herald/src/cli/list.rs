//! `commands` subcommand.

use herald_commands::{CommandRegistry, HandlerCatalog};
use std::path::Path;

/// Load the manifests under `dir` and print each accepted command.
pub async fn handle_commands_command(dir: &Path) -> anyhow::Result<()> {
    tracing::info!(dir = %dir.display(), "Loading command manifests");
    let registry = CommandRegistry::load(dir, &HandlerCatalog::with_builtins()).await;

    for definition in registry.iter() {
        println!("/{:<12} {}", definition.name(), definition.description());
    }
    println!(
        "{} command(s) loaded from {}",
        registry.len(),
        dir.display()
    );
    Ok(())
}
