//! Discovery, indexing and remote registration of command definitions.

use crate::{CommandDefinition, CommandManifest, CommandPayload, HandlerCatalog};
use async_trait::async_trait;
use herald_error::{CommandLoadError, CommandLoadErrorKind, RegistrationError};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Where a replace-all registration applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistrationTarget {
    /// Every guild
    Global,
    /// One guild, by id
    Guild(String),
}

impl std::fmt::Display for RegistrationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Guild(id) => write!(f, "guild {id}"),
        }
    }
}

/// Remote endpoint that replaces the full command set in one call.
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    /// Replace every registered command at `target` with `commands`.
    async fn replace_all(
        &self,
        target: &RegistrationTarget,
        commands: &[CommandPayload],
    ) -> Result<(), RegistrationError>;
}

/// Snapshot of loaded commands, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandDefinition>,
}

impl CommandRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root` recursively and load every `*.toml` manifest.
    ///
    /// Manifests that fail to parse or validate are skipped with a warning,
    /// as are later files that reuse an already loaded name (the first file in
    /// sorted path order wins). A missing root yields an empty registry.
    #[instrument(skip(catalog), fields(root = %root.as_ref().display()))]
    pub async fn load(root: impl AsRef<Path>, catalog: &HandlerCatalog) -> Self {
        let mut registry = Self::new();
        let files = match collect_manifests(root.as_ref()).await {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "No commands directory found, skipping command load");
                return registry;
            }
        };

        for path in files {
            match load_manifest(&path, catalog).await {
                Ok(definition) => {
                    let name = definition.name().clone();
                    match registry.insert(definition) {
                        Ok(()) => debug!(command = %name, path = %path.display(), "Command loaded"),
                        Err(e) => warn!(path = %path.display(), error = %e, "Discarding command manifest"),
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Discarding command manifest"),
            }
        }

        info!(count = registry.len(), "Commands loaded");
        registry
    }

    /// Add a definition; names already present are rejected.
    pub fn insert(&mut self, definition: CommandDefinition) -> Result<(), CommandLoadError> {
        if self.commands.contains_key(definition.name()) {
            return Err(CommandLoadError::new(CommandLoadErrorKind::Duplicate(
                definition.name().clone(),
            )));
        }
        self.commands.insert(definition.name().clone(), definition);
        Ok(())
    }

    /// Definition registered under `name` (case-sensitive).
    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    /// Number of loaded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is loaded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.values()
    }

    /// Registration payload for every definition.
    pub fn payload(&self) -> Vec<CommandPayload> {
        self.iter().map(CommandDefinition::to_payload).collect()
    }

    /// Submit every definition to `registrar` as one replace-all call.
    ///
    /// An empty registry submits nothing. Returns the number of commands sent.
    #[instrument(skip(self, registrar), fields(count = self.len()))]
    pub async fn register(
        &self,
        registrar: &dyn CommandRegistrar,
        target: &RegistrationTarget,
    ) -> Result<usize, RegistrationError> {
        if self.is_empty() {
            info!("No commands to register");
            return Ok(0);
        }
        let payload = self.payload();
        registrar.replace_all(target, &payload).await?;
        info!(count = payload.len(), %target, "Registered commands");
        Ok(payload.len())
    }
}

async fn load_manifest(
    path: &Path,
    catalog: &HandlerCatalog,
) -> Result<CommandDefinition, CommandLoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CommandLoadError::new(CommandLoadErrorKind::Io(e.to_string())))?;
    let manifest = CommandManifest::parse(&content)?;
    CommandDefinition::from_manifest(manifest, catalog)
}

/// Every `*.toml` file under `root`, sorted by path.
///
/// Symlinks are followed; each directory is walked once by canonical path.
/// Only an unreadable root is an error, nested failures lose that entry.
async fn collect_manifests(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut visited = HashSet::from([tokio::fs::canonicalize(root).await?]);
    let mut pending = list_dir(root).await?;
    let mut files = Vec::new();

    while let Some(path) = pending.pop() {
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if metadata.is_dir() {
            match tokio::fs::canonicalize(&path).await {
                Ok(canonical) if !visited.insert(canonical.clone()) => {
                    debug!(dir = %path.display(), "Directory already walked");
                }
                Ok(_) => match list_dir(&path).await {
                    Ok(entries) => pending.extend(entries),
                    Err(e) => {
                        warn!(dir = %path.display(), error = %e, "Skipping unreadable directory")
                    }
                },
                Err(e) => warn!(dir = %path.display(), error = %e, "Skipping unreadable directory"),
            }
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        } else {
            debug!(path = %path.display(), "Ignoring non-manifest file");
        }
    }

    files.sort();
    Ok(files)
}

async fn list_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    Ok(paths)
}
