//! Remote command registration error types.

/// Remote command sync failed.
///
/// The session stays open when this happens; commands may simply be
/// unavailable on the platform until the next successful registration.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Registration Error: {} ({} commands) at line {} in {}", message, command_count, line, file)]
pub struct RegistrationError {
    /// Error message
    pub message: String,
    /// Number of command definitions in the rejected payload
    pub command_count: usize,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl RegistrationError {
    /// Create a new RegistrationError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>, command_count: usize) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            command_count,
            line: location.line(),
            file: location.file(),
        }
    }
}
