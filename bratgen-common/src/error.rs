//! Common error types for bratgen

use thiserror::Error;

/// Common result type for bratgen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the bratgen crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding error (wraps toml::de::Error)
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (index out of range, malformed value)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
