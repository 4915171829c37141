//! Unified error types for buildpulse

use thiserror::Error;

/// Unified error type for all buildpulse operations
///
/// None of these errors are allowed to abort the host build. Every call site
/// that crosses back into the build tool recovers locally: wrap failures skip
/// one hook, aggregation failures skip one stats source, sink failures log a
/// warning.
#[derive(Error, Debug)]
pub enum PulseError {
    // Hook instrumentation errors
    #[error("Hook wrap failed: {0}")]
    Wrap(String),

    // Aggregation errors
    #[error("Stats aggregation failed for {provider}: {message}")]
    Aggregation { provider: String, message: String },

    #[error("Unknown stats provider: {0}")]
    UnknownProvider(String),

    // Sink errors
    #[error("Metric sink error: {0}")]
    Sink(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using PulseError
pub type Result<T> = std::result::Result<T, PulseError>;
