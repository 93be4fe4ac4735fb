//! Error types for the fusion pipeline.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Recorded frame data could not be decoded
    #[error("Frame data error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tracker could not produce a result for the frame
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// Replay source exhausted or malformed
    #[error("Replay error: {0}")]
    Replay(String),

    /// Album blob could not be stored or restored
    #[error("Album error: {0}")]
    Album(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
