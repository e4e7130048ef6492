//! Errors raised when the bot's settings cannot support an operation.

/// A bot setting is missing or unusable, with the call site that noticed.
///
/// `start` raises this when no bot token or application id is configured,
/// and the invite link needs an application id too. The control API maps it
/// to `400 Bad Request`, so the message is written for whoever fills in setup.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// What is missing and how to fix it
    pub message: String,
    /// Line that raised the error
    pub line: u32,
    /// File that raised the error
    pub file: &'static str,
}

impl ConfigError {
    /// Records `message` against the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use herald_error::ConfigError;
    ///
    /// let err = ConfigError::new("Missing bot token. Please configure the bot token in setup.");
    /// assert!(err.to_string().starts_with("Bot setup incomplete: Missing bot token."));
    /// ```
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

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bot setup incomplete: {} ({}:{})",
            self.message, self.file, self.line
        )
    }
}

impl std::error::Error for ConfigError {}
