//! Error types for Sonda operations.
//!
//! Errors are split the same way a scan is:
//!
//! - **`Error`**: request-level failures that abort the whole operation
//!   (malformed identifiers, missing environment roots, unreadable config)
//! - **`ScanError`**: file-level failures that are logged, collected and skipped
//!
//! A routine or table that cannot be found is *not* an error. It is reported
//! as data (`FindOutcome::NotFound`, an empty search) so callers can render it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Sonda operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Sonda operations.
///
/// Only `InvalidInput` and `ConfigurationMissing` are expected during normal
/// operation; the other variants come from loading configuration files.
#[derive(Debug, Error)]
pub enum Error {
    /// The routine or table identifier was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required environment root is not configured.
    #[error("environment root not configured: set {setting}")]
    ConfigurationMissing {
        /// Name of the setting (environment variable) that must be provided.
        setting: &'static str,
    },

    /// The configuration file exists but could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The routine report could not be written.
    #[error("failed to render report")]
    Render(#[from] std::fmt::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidInput`] with a formatted message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Returns `true` if the caller can fix the request: a malformed
    /// identifier, or an environment whose root is not configured.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::ConfigurationMissing { .. })
    }
}

/// Error encountered while scanning a specific file or directory.
///
/// These errors are collected during a scan but don't halt it.
#[derive(Debug, Clone)]
pub struct ScanError {
    /// Path to the file or directory that failed
    pub path: PathBuf,
    /// Category of the error
    pub kind: ScanErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.path.display(),
            self.message,
            self.kind
        )
    }
}

impl std::error::Error for ScanError {}

/// Where in a scan the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Could not read the file from disk
    IoError,

    /// A directory could not be listed during the walk
    WalkError,
}

impl std::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError => write!(f, "I/O error"),
            Self::WalkError => write!(f, "walk error"),
        }
    }
}

impl ScanError {
    /// Create a new scan error.
    #[must_use]
    pub fn new(path: PathBuf, kind: ScanErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    /// Create an I/O error for a file.
    #[must_use]
    pub fn io_error(path: PathBuf, error: &std::io::Error) -> Self {
        Self::new(path, ScanErrorKind::IoError, error.to_string())
    }
}
