//! Error types for cupstat
//!
//! All fallible operations in the crate return [`Result`], backed by the
//! [`CupstatError`] enum. Line-level parse failures are deliberately *not*
//! errors: the parser drops bad lines and keeps going, so only I/O,
//! configuration and argument problems surface here.

use thiserror::Error;

/// Main error type for cupstat operations
#[derive(Error, Debug)]
pub enum CupstatError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid date argument
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Invalid timezone argument
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Unknown report kind requested
    #[error("Unknown report kind: {0}")]
    UnknownReport(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, CupstatError>;
