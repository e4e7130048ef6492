//! Gateway connection lifecycle for Herald.
//!
//! [`ConnectionSupervisor`] owns at most one gateway session at a time,
//! recovers it with bounded exponential backoff after unexpected
//! disconnects, and exposes the administrative operations (start, stop,
//! restart, presence, profile, configuration, invite links).
//!
//! The platform client sits behind [`GatewayConnector`] and
//! [`GatewaySession`]. Enable the `discord` feature for the serenity-backed
//! [`DiscordConnector`].

#![warn(missing_docs)]

#[cfg(feature = "discord")]
mod discord;
mod gateway;
mod invite;
mod presence;
mod profile;
mod supervisor;

#[cfg(feature = "discord")]
pub use discord::DiscordConnector;
pub use gateway::{
    GatewayConnection, GatewayConnector, GatewayEvent, GatewaySession, LoginSettings,
    PresenceSnapshot, ProfileEdit, SessionHandle,
};
pub use invite::invite_link;
pub use presence::{COMMAND_PREFIX, FALLBACK_SERVER_NAME, expand};
pub use profile::ProfileUpdate;
pub use supervisor::{
    ApplyOutcome, ConnectionState, ConnectionSupervisor, EMPTY_ACTIVITY_TEXT,
    MAX_RECOVERY_ATTEMPTS, SupervisorOptions, SupervisorStatus, recovery_delay,
};
