//! Slash commands for Herald.
//!
//! Commands are declared as TOML manifests on disk and bound to handlers
//! compiled into a [`HandlerCatalog`]. [`CommandRegistry::load`] discovers
//! and validates manifests, [`CommandRegistry::register`] pushes them to the
//! platform, and [`InteractionDispatcher`] routes invocations back to the
//! handlers.

#![warn(missing_docs)]

pub mod builtins;
mod definition;
mod dispatcher;
mod handler;
mod interaction;
mod registry;

pub use definition::{
    CommandDefinition, CommandManifest, CommandOption, CommandPayload, OptionKind, OptionPayload,
};
pub use dispatcher::{DispatchOutcome, HANDLER_ERROR_MESSAGE, InteractionDispatcher};
pub use handler::{CommandContext, CommandHandler, HandlerCatalog};
pub use interaction::{Interaction, InteractionResponder, Reply, ResponseState};
pub use registry::{CommandRegistrar, CommandRegistry, RegistrationTarget};
