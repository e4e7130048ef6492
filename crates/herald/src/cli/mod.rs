//! Command-line interface for the herald binary.

mod commands;
mod list;
mod run;

pub use commands::{Cli, Commands};
pub use list::handle_commands_command;
pub use run::handle_run_command;
