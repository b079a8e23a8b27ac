//! Error types for sql-submit.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for script submission.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The script source could not be read (missing file, bad URL, HTTP failure).
    #[error("Source error: {0}")]
    Source(String),

    /// A statement could not be turned into an operation.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An immediate or combined execution failed in the engine.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration errors (invalid config file, conflicting arguments, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubmitError {
    /// Creates a source error with the given message.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Source(_) => "Source Error",
            Self::Parse(_) => "Parse Error",
            Self::Execution(_) => "Execution Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using SubmitError.
pub type Result<T> = std::result::Result<T, SubmitError>;
