//! Error types for BrickMapper.
//!
//! Library crates use [`BrickMapperError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Malformed model output is deliberately absent here: the response parser
//! recovers from it locally and it never becomes an error.

use std::path::PathBuf;

/// Top-level error type for all BrickMapper operations.
#[derive(Debug, thiserror::Error)]
pub enum BrickMapperError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network error outside of a retrieval or generation call (client setup).
    #[error("network error: {0}")]
    Network(String),

    /// The retriever was unreachable or returned an error.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// The language model call failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// A row did not finish within its time budget.
    #[error("row timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Anything else that went wrong while processing a row (e.g. a panic).
    #[error("unexpected error: {0}")]
    Unexpected(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad input file, bad endpoint URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BrickMapperError>;

impl BrickMapperError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
