use thiserror::Error;

/// Hotline engine errors
#[derive(Error, Debug)]
pub enum HotlineError {
    /// Operator or call id not present
    #[error("Not found: {0}")]
    NotFound(String),

    /// Answer/reject against an operator that is not ringing
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Invalid settings at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Verb outside the closed command set
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Missing or malformed command identifier
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Request line that is too long or not UTF-8
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Undecodable wire frame
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Configuration source could not be read or deserialized
    #[error("Configuration error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// Socket and stdio failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine task has stopped
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl HotlineError {
    /// Create a new NotFound error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidTransition error
    pub fn invalid_transition<S: Into<String>>(msg: S) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create a new Configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new UnknownCommand error
    pub fn unknown_command<S: Into<String>>(verb: S) -> Self {
        Self::UnknownCommand(verb.into())
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new InvalidFrame error
    pub fn invalid_frame<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFrame(msg.into())
    }

    /// Create a new EngineUnavailable error
    pub fn engine_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::EngineUnavailable(msg.into())
    }

    /// Whether the error was caused by the command itself rather than the process
    pub fn is_command_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::InvalidTransition(_)
                | Self::UnknownCommand(_)
                | Self::InvalidArgument(_)
                | Self::InvalidFrame(_)
                | Self::Protocol(_)
        )
    }
}

/// Result type for hotline operations
pub type Result<T> = std::result::Result<T, HotlineError>;
