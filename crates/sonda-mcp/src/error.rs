//! Error types for the sonda MCP server.

use thiserror::Error;

/// Errors that can occur in the sonda MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument value provided.
    #[error("Invalid {field}: '{value}'. Valid values: {valid_values}")]
    InvalidArgument {
        /// The field name that had an invalid value.
        field: &'static str,
        /// The invalid value that was provided.
        value: String,
        /// Description of valid values.
        valid_values: &'static str,
    },

    /// An error from the sonda library.
    #[error(transparent)]
    Sonda(#[from] sonda::Error),

    /// A blocking lookup panicked or was cancelled.
    #[error("Lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// MCP protocol error.
    #[error("MCP error: {0}")]
    Mcp(String),
}

impl Error {
    /// Returns `true` if the caller sent a bad request or asked for an
    /// environment that is not configured.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidArgument { .. } => true,
            Self::Sonda(e) => e.is_input_error(),
            _ => false,
        }
    }
}

/// Result type for sonda MCP operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified() {
        let invalid = Error::InvalidArgument {
            field: "action",
            value: "compile".to_string(),
            valid_values: "locate",
        };
        assert!(invalid.is_input_error());
        assert!(invalid.to_string().contains("compile"));

        let missing = Error::from(sonda::Error::ConfigurationMissing {
            setting: "SONDA_STAGING_ROOT",
        });
        assert!(missing.is_input_error());
        assert!(missing.to_string().contains("SONDA_STAGING_ROOT"));

        assert!(!Error::Mcp("closed".to_string()).is_input_error());
    }
}
