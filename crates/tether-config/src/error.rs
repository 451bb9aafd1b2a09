//! Error types for configuration handling

use std::path::PathBuf;

use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The remote URL could not be parsed. `input` is already scrubbed of credentials.
    #[error("Invalid remote URL '{input}': {reason}")]
    InvalidUrl {
        /// Scrubbed form of the rejected input
        input: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// A bare name was given as URL but no alias with that name is configured
    #[error("Unknown remote alias '{0}'")]
    UnknownAlias(String),

    /// A recognized option carried a value of the wrong shape
    #[error("Invalid option '{key}': {message}")]
    InvalidOption {
        /// Option key as written by the caller
        key: String,
        /// Details from the deserializer
        message: String,
    },

    /// Two settings contradict each other
    #[error("Conflicting settings: {0}")]
    Conflict(String),

    /// The configuration file could not be read
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The configuration file could not be parsed
    #[error("Failed to parse config file {path:?}: {message}")]
    Parse {
        /// File that was being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// File extension is not one of the supported formats
    #[error("Unsupported config format: {0:?}")]
    UnsupportedFormat(PathBuf),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub(crate) fn invalid_option(key: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidOption {
            key: key.into(),
            message: message.to_string(),
        }
    }
}
