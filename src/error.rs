//! Classified errors that callers need to tell apart.
//!
//! Everything else in the crate returns [`anyhow::Result`]. These types exist so
//! the CLI can downcast and choose an exit code without string matching.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading session logs.
#[derive(Debug, Error)]
pub enum LogError {
    /// The project's log directory does not exist.
    #[error("Log directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// A line in a log file is not valid JSON.
    #[error("Invalid JSON on line {line} of {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A log file could not be read.
    #[error("Failed to parse log file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Setup problems detected before any indexing work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown embedding provider: {0}. Supported: local, remote")]
    UnknownProvider(String),

    #[error("environment variable {0} must be set for the remote embedding provider")]
    MissingApiKey(String),

    #[error("{what} not found at {}. Run `search-logs model download` first.", .path.display())]
    MissingModelFile { what: &'static str, path: PathBuf },

    #[error("the local provider only runs {supported}; {requested:?} needs the remote provider")]
    UnsupportedLocalModel {
        requested: String,
        supported: &'static str,
    },

    #[error("invalid collection name {0:?}: use 1-63 characters from [A-Za-z0-9_-]")]
    InvalidCollectionName(String),
}
