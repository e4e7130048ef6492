//! CLI argument definitions.

use clap::{Parser, Subcommand};
use herald_config::LocalSettings;
use std::path::PathBuf;

/// Keep a Discord bot connected and drive it over HTTP.
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(version, about)]
pub struct Cli {
    /// Settings file layered under `HERALD_*` environment variables
    #[arg(short, long, default_value = "herald.toml")]
    pub config: PathBuf,

    /// Bot token
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Application (client) id
    #[arg(long, env = "DISCORD_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Guild for guild-scoped command registration
    #[arg(long, env = "DISCORD_GUILD_ID")]
    pub guild_id: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Boot settings with the CLI/environment overrides applied.
    pub fn settings(&self) -> Result<LocalSettings, herald_error::ConfigError> {
        Ok(LocalSettings::load(Some(self.config.as_path()))?
            .with_token(self.token.clone())
            .with_application_id(self.client_id.clone())
            .with_guild_id(self.guild_id.clone()))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the control API and supervise the gateway connection
    Run {
        /// Address for the control API, overrides the settings file
        #[arg(long)]
        listen: Option<String>,

        /// Connect to the gateway right away
        #[arg(long)]
        auto_start: bool,
    },

    /// Print the link that adds the bot to a server
    Invite {
        /// Permission bitmask, defaults to the configured one
        #[arg(long)]
        permissions: Option<String>,
    },

    /// Load the command manifests and list what was accepted
    Commands {
        /// Manifest directory, defaults to the configured one
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
