//! Command handler error types.

/// Kinds of command handler failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum HandlerErrorKind {
    /// Handler returned an error
    #[display("Handler '{}' failed: {}", command, reason)]
    Failed {
        /// Command name
        command: String,
        /// Failure description
        reason: String,
    },
    /// Handler task panicked or was cancelled
    #[display("Handler '{}' aborted: {}", command, reason)]
    Aborted {
        /// Command name
        command: String,
        /// Panic or cancellation description
        reason: String,
    },
    /// An option value was missing or out of range
    #[display("Invalid option '{}': {}", name, reason)]
    InvalidOption {
        /// Option name
        name: String,
        /// Why the value was rejected
        reason: String,
    },
    /// Sending a response to the platform failed
    #[display("Response failed: {}", _0)]
    Respond(String),
    /// The interaction was already answered with an initial response
    #[display("Interaction already acknowledged")]
    AlreadyAcknowledged,
}

/// Handler error with location tracking.
///
/// # Examples
///
/// ```
/// use herald_error::{HandlerError, HandlerErrorKind};
///
/// let err = HandlerError::new(HandlerErrorKind::Respond("timeout".to_string()));
/// assert!(format!("{}", err).contains("timeout"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Handler Error: {} at line {} in {}", kind, line, file)]
pub struct HandlerError {
    /// The kind of error that occurred
    pub kind: HandlerErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl HandlerError {
    /// Create a new handler error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: HandlerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for [`HandlerErrorKind::InvalidOption`].
    #[track_caller]
    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        })
    }

    /// Shorthand for [`HandlerErrorKind::Respond`].
    #[track_caller]
    pub fn respond(reason: impl Into<String>) -> Self {
        Self::new(HandlerErrorKind::Respond(reason.into()))
    }
}

/// Result type for command handlers.
pub type HandlerResult<T> = Result<T, HandlerError>;
