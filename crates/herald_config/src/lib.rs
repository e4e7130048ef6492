//! Configuration for Herald.
//!
//! - [`LocalSettings`] - boot settings from file and environment
//! - [`RuntimeConfig`] - the effective settings the supervisor reads
//! - [`ConfigBinder`] - merges [`ConfigRecord`]s onto the effective settings
//! - [`ConfigStore`] - load-one/save-one persistence of the record

#![warn(missing_docs)]

mod binder;
mod record;
mod runtime;
mod settings;
mod store;

pub use binder::ConfigBinder;
pub use record::ConfigRecord;
pub use runtime::{
    ActivityKind, CommandScope, DEFAULT_CALLBACK_URL, DEFAULT_INVITE_PERMISSIONS,
    DEFAULT_PRESENCE_TEXT, PresenceSpec, PresenceSpecBuilder, PresenceStatus, RuntimeConfig,
    RuntimeConfigBuilder,
};
pub use settings::LocalSettings;
pub use store::{ConfigStore, JsonFileStore, MemoryStore, ensure_config};
