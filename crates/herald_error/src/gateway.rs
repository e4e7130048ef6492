//! Gateway call error types.

/// A presence or profile call against a live session failed.
#[derive(Debug, Clone)]
pub struct GatewayError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl GatewayError {
    /// Create a new GatewayError with the given message at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Gateway Error: {} at line {} in {}",
            self.message, self.line, self.file
        )
    }
}

impl std::error::Error for GatewayError {}
