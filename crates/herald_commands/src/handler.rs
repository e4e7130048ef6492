//! The fixed contract every command handler implements.

use crate::{CommandRegistry, Interaction};
use async_trait::async_trait;
use herald_error::HandlerResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Everything a handler gets for one invocation.
#[derive(Clone)]
pub struct CommandContext {
    interaction: Arc<Interaction>,
    commands: Arc<CommandRegistry>,
    started_at: Instant,
}

impl CommandContext {
    /// Bundle an invocation with the registry snapshot it was routed through.
    pub fn new(
        interaction: Arc<Interaction>,
        commands: Arc<CommandRegistry>,
        started_at: Instant,
    ) -> Self {
        Self {
            interaction,
            commands,
            started_at,
        }
    }

    /// The invocation being handled.
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Commands loaded alongside this one.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// When the dispatcher was created, i.e. process uptime origin.
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// A compiled command implementation.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle one invocation. Returning an error makes the dispatcher send
    /// an ephemeral error message on the handler's behalf.
    async fn execute(&self, ctx: CommandContext) -> HandlerResult<()>;
}

/// Handlers available to manifests, keyed by handler name.
#[derive(Clone, Default)]
pub struct HandlerCatalog {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the bundled handlers.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        crate::builtins::register(&mut catalog);
        catalog
    }

    /// Add or replace a handler.
    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Look up a handler by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCatalog")
            .field("handlers", &self.names())
            .finish()
    }
}
