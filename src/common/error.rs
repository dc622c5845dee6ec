//! Error types for cluster-agent

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Discovery Errors ===
    #[error("No leader available: every manager probe failed")]
    NoLeaderAvailable,

    // === Stream Errors ===
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Event stream closed by {0}")]
    StreamClosed(String),

    #[error("Dispatch queue closed")]
    DispatchClosed,

    // === Decode Errors ===
    #[error("Malformed task event payload: {0}")]
    Decode(#[from] serde_json::Error),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Startup Errors ===
    #[error("{subsystem} failed to start: {reason}")]
    Startup { subsystem: String, reason: String },

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn startup(subsystem: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Startup {
            subsystem: subsystem.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
