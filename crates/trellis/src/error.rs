//! Error types for trellis operations.

use crate::domain::IssueId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for trellis operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation targeted an id that no issue has.
    #[error("Issue not found: #{0}")]
    NotFound(IssueId),

    /// A required field was missing or malformed.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The backing store could not be reached or answered with a failure.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for errors caused by the backend rather than the request.
    ///
    /// Reads that fail this way degrade to an empty board with a retry hint.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }

    /// Returns `true` if the requested issue does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Errors raised while locating, reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.trellis/` directory was found up the directory tree.
    #[error("Not a trellis repository (or any parent directory). Run 'trellis init' first.")]
    NotInitialized,

    /// `trellis init` was run where a repository already exists.
    #[error("Trellis is already initialized here. Found existing '{}'", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The config file could not be parsed or written.
    #[error("Invalid configuration file: {0}")]
    Parse(String),

    /// The remote backend was selected without its connection settings.
    #[error("Storage backend 'remote' requires a 'storage.remote' section")]
    MissingRemote,

    /// A configuration value failed validation.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Dotted path of the offending key.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// A specialized Result type for trellis operations.
pub type Result<T> = std::result::Result<T, Error>;
