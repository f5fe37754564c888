//! Error types for trellobackup.
//!
//! Library crates use [`TrelloBackupError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all trellobackup operations.
#[derive(Debug, thiserror::Error)]
pub enum TrelloBackupError {
    /// Missing or invalid configuration (API key, config file).
    #[error("config error: {message}")]
    Config { message: String },

    /// The Trello API returned an empty, falsy, or unreadable response.
    #[error("API error: {message}")]
    Api { message: String },

    /// The backup folder could not be created.
    #[error("save error: {message}")]
    Save { message: String },

    /// Invalid input handed to the transcript converter.
    #[error("input error: {message}")]
    Input { message: String },

    /// Transport failure while talking to Trello or an attachment host.
    #[error("network error: {0}")]
    Network(String),

    /// JSON that does not have the expected shape.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TrelloBackupError>;

impl TrelloBackupError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an API error from any displayable message.
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api {
            message: msg.into(),
        }
    }

    /// Create a save error from any displayable message.
    pub fn save(msg: impl Into<String>) -> Self {
        Self::Save {
            message: msg.into(),
        }
    }

    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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
