//! Command manifest loading error types.

/// Reasons a single command manifest is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CommandLoadErrorKind {
    /// File could not be read
    #[display("I/O error: {}", _0)]
    Io(String),
    /// File is not a valid manifest document
    #[display("Parse error: {}", _0)]
    Parse(String),
    /// A required field is missing or malformed
    #[display("Invalid field '{}': {}", field, reason)]
    InvalidField {
        /// Field name
        field: String,
        /// Why it was rejected
        reason: String,
    },
    /// The manifest names a handler that is not compiled in
    #[display("Unknown handler: {}", _0)]
    UnknownHandler(String),
    /// Another manifest already claimed this command name
    #[display("Duplicate command name: {}", _0)]
    Duplicate(String),
}

/// Command load error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Command Load Error: {} at line {} in {}", kind, line, file)]
pub struct CommandLoadError {
    /// The kind of error that occurred
    pub kind: CommandLoadErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CommandLoadError {
    /// Create a new command load error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CommandLoadErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for [`CommandLoadErrorKind::InvalidField`].
    #[track_caller]
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(CommandLoadErrorKind::InvalidField {
            field: field.into(),
            reason: reason.into(),
        })
    }
}
