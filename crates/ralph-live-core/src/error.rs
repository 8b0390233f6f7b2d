//! Error types for ralph-live-core.

use thiserror::Error;

/// Result type alias using ralph-live-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for live-session operations
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // Stream errors
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Stream closed by server")]
    StreamClosed,

    #[error("Already connected to orchestrator {0}; disconnect first")]
    AlreadyConnected(String),

    #[error("No orchestrator target to reconnect to")]
    NoTarget,

    // Control errors
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Another command is still in flight")]
    MutationInFlight,

    #[error("Orchestrator {0} is not the active orchestrator")]
    NotActive(String),

    #[error("Orchestrator {0} is already active; stop it before starting another")]
    AlreadyActive(String),

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Action already resolved: {0}")]
    ActionAlreadyResolved(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an API error from an HTTP status and server message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
