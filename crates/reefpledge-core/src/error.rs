//! Error types for reefpledge-core

use thiserror::Error;

/// Result type alias using reefpledge-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in reefpledge-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote endpoint rejected a delivery
    #[error("Remote API error ({code}): {message}")]
    Api {
        /// Error code reported by the remote endpoint
        code: String,
        /// Human-readable message reported by the remote endpoint
        message: String,
    },

    /// Transport has no bulk delivery path
    #[error("Transport does not support batch delivery")]
    BatchUnsupported,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
