//! Herald binary.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, handle_commands_command, handle_run_command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command {
        Commands::Run { listen, auto_start } => {
            handle_run_command(settings, listen, auto_start).await
        }
        Commands::Invite { permissions } => {
            let fallback = settings.runtime_fallback();
            let application_id = fallback.application_id().as_deref().unwrap_or_default();
            let permissions = permissions.unwrap_or_else(|| fallback.invite_permissions().clone());
            let url = herald_bot::invite_link(application_id, &permissions)?;
            println!("{url}");
            Ok(())
        }
        Commands::Commands { dir } => {
            let dir = dir.unwrap_or_else(|| settings.commands_dir().clone());
            handle_commands_command(&dir).await
        }
    }
}
