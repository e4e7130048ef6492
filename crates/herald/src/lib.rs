//! Herald: keeps a Discord bot connected and lets an operator drive it.
//!
//! This crate re-exports the workspace crates and adds the HTTP
//! [`control`] API served by the `herald` binary.

#![warn(missing_docs)]

pub mod control;

pub use control::{ControlState, create_router};
pub use herald_bot::*;
pub use herald_commands::{
    CommandDefinition, CommandRegistry, HandlerCatalog, Interaction, InteractionDispatcher, Reply,
};
pub use herald_config::{
    ActivityKind, CommandScope, ConfigRecord, ConfigStore, JsonFileStore, LocalSettings,
    MemoryStore, RuntimeConfig,
};
pub use herald_error::{HeraldError, HeraldErrorKind, HeraldResult};
