//! Error types for citemark-core

use thiserror::Error;

/// Result type for citemark-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for citemark-core
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem error while touching the session directory or citation file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stage name other than `planning` / `research`
    #[error("Unknown citation stage: {0}")]
    UnknownStage(String),

    /// Citation not present in the store
    #[error("Citation not found: {0}")]
    NotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
