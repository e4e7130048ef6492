//! Error types for Herald.
//!
//! Every error carries the file and line where it was created. Category
//! errors convert into [`HeraldError`] through [`HeraldErrorKind`], so
//! operations that cross categories can use `?` freely.

#![warn(missing_docs)]

mod command_load;
mod config;
mod connection;
mod gateway;
mod handler;
mod registration;
mod store;

pub use command_load::{CommandLoadError, CommandLoadErrorKind};
pub use config::ConfigError;
pub use connection::ConnectionError;
pub use gateway::GatewayError;
pub use handler::{HandlerError, HandlerErrorKind, HandlerResult};
pub use registration::RegistrationError;
pub use store::{StoreError, StoreErrorKind};

/// Crate-level error variants.
#[derive(Debug, derive_more::From, derive_more::Display)]
pub enum HeraldErrorKind {
    /// Missing or invalid settings
    #[display("{}", _0)]
    Config(ConfigError),
    /// Gateway login rejected
    #[display("{}", _0)]
    Connection(ConnectionError),
    /// Remote command sync failed
    #[display("{}", _0)]
    Registration(RegistrationError),
    /// Presence or profile call failed
    #[display("{}", _0)]
    Gateway(GatewayError),
    /// Persisted configuration could not be read or written
    #[display("{}", _0)]
    Store(StoreError),
    /// Command handler failed
    #[display("{}", _0)]
    Handler(HandlerError),
    /// Command manifest rejected
    #[display("{}", _0)]
    CommandLoad(CommandLoadError),
}

/// Herald error with kind discrimination.
#[derive(Debug)]
pub struct HeraldError(Box<HeraldErrorKind>);

impl HeraldError {
    /// Create a new error from a kind.
    pub fn new(kind: HeraldErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &HeraldErrorKind {
        &self.0
    }
}

impl std::fmt::Display for HeraldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Herald Error: {}", self.0)
    }
}

impl std::error::Error for HeraldError {}

impl<T> From<T> for HeraldError
where
    T: Into<HeraldErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Herald operations.
pub type HeraldResult<T> = std::result::Result<T, HeraldError>;
