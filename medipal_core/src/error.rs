//! Error types for the medipal_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medipal_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// Malformed schedule data (weekday out of range, bad "HH:MM")
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Calendar request outside the representable range
    #[error("Calendar error: {0}")]
    Calendar(String),

    /// Text generation backend failed
    #[error("Generator error: {0}")]
    Generator(String),

    /// No row with the given identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
