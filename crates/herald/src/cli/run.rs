//! `run` subcommand: supervise the connection and serve the control API.

use herald::control::{ControlState, create_router};
use anyhow::Context;
use herald_bot::{ConnectionSupervisor, GatewayConnector, SupervisorOptions};
use herald_config::{ConfigStore, JsonFileStore, LocalSettings};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Boot the supervisor, optionally connect, and serve until Ctrl+C.
pub async fn handle_run_command(
    settings: LocalSettings,
    listen: Option<String>,
    auto_start: bool,
) -> anyhow::Result<()> {
    if !settings.is_configured() {
        warn!("Setup incomplete: token, client id, client secret and session secret are required");
    }

    let store: Option<Arc<dyn ConfigStore>> = settings.store_path().as_ref().map(|path| {
        info!(path = %path.display(), "Using persisted configuration");
        Arc::new(JsonFileStore::new(path)) as Arc<dyn ConfigStore>
    });

    let mut options =
        SupervisorOptions::default().with_commands_dir(settings.commands_dir().clone());
    if let Some(store) = &store {
        options = options.with_store(Arc::clone(store));
    }
    let supervisor = ConnectionSupervisor::new(connector()?, settings.runtime_fallback(), options);

    let stored_auto_start = match &store {
        Some(store) => store
            .find_one()
            .await
            .context("Failed to read persisted configuration")?
            .and_then(|record| record.auto_start),
        None => None,
    };
    if auto_start || stored_auto_start.unwrap_or(*settings.auto_start()) {
        info!("Auto-starting bot");
        if let Err(e) = supervisor.start().await {
            error!(error = %e, "Auto-start failed");
        }
    }

    let mut state = ControlState::new(Arc::clone(&supervisor));
    if let Some(store) = store {
        state = state.with_store(store);
    }

    let listen = listen.unwrap_or_else(|| settings.listen().clone());
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("Failed to bind control API to {listen}"))?;
    info!(%listen, "Control API listening. Press Ctrl+C to stop.");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Control API failed")?;

    info!("Shutting down");
    supervisor.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }
}

#[cfg(feature = "discord")]
fn connector() -> anyhow::Result<Arc<dyn GatewayConnector>> {
    Ok(Arc::new(herald_bot::DiscordConnector::new()))
}

#[cfg(not(feature = "discord"))]
fn connector() -> anyhow::Result<Arc<dyn GatewayConnector>> {
    anyhow::bail!("herald was built without the discord feature")
}
