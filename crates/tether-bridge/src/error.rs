//! Errors surfaced to callers of the bridge
//!
//! Every variant that involves the remote side names the URL in its scrubbed
//! form, so messages are safe to log.

use tether_config::{ConfigError, RemoteUrl};
use tether_core::{CoreError, DriverError, LocalQueryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Handshake, authentication or network failure while opening a session
    #[error("Failed to connect to {url}{}: {message}", for_statement(.index))]
    ConnectionFailure {
        url: String,
        /// 1-based position in a replayed statement stream
        index: Option<usize>,
        message: String,
    },

    /// The remote returned a value kind with no local mapping
    #[error(
        "Unsupported value type '{type_name}' in column '{column}' from {url}{}",
        for_statement(.index)
    )]
    UnsupportedVariant {
        url: String,
        index: Option<usize>,
        column: String,
        type_name: String,
    },

    /// A write was attempted on a read-only session
    #[error(
        "{url} refused a write on a read-only session{}: {code}: {message} (statement: {statement})",
        for_statement(.index)
    )]
    ReadOnlyViolation {
        url: String,
        statement: String,
        index: Option<usize>,
        code: String,
        message: String,
    },

    /// The remote rejected or aborted a statement
    #[error(
        "Remote statement{} failed on {url}: {}{message} (statement: {statement})",
        position(.index),
        code_prefix(.code)
    )]
    RemoteStatementFailure {
        url: String,
        statement: String,
        /// 1-based position in a replayed statement stream
        index: Option<usize>,
        code: Option<String>,
        message: String,
    },

    #[error(transparent)]
    LocalQueryFailure(#[from] LocalQueryError),

    #[error("Invalid statement stream at row {index}: {message}")]
    InvalidStatementStream { index: usize, message: String },

    #[error("A remote statement is required unless streamStatements is set")]
    MissingRemoteStatement,

    #[error("A local query engine is required for load_from_local")]
    NoLocalEngine,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

fn position(index: &Option<usize>) -> String {
    index.map(|i| format!(" #{}", i)).unwrap_or_default()
}

fn for_statement(index: &Option<usize>) -> String {
    index
        .map(|i| format!(" for statement #{}", i))
        .unwrap_or_default()
}

fn code_prefix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!("{}: ", c)).unwrap_or_default()
}

impl BridgeError {
    /// Failure while opening a session
    pub fn connection(url: &RemoteUrl, err: DriverError) -> Self {
        Self::ConnectionFailure {
            url: url.scrubbed(),
            index: None,
            message: err.to_string(),
        }
    }

    /// Failure while running or streaming `statement`
    pub fn from_driver(url: &RemoteUrl, statement: &str, err: DriverError) -> Self {
        if err.is_connection_error() {
            return Self::connection(url, err);
        }
        match err {
            DriverError::Remote { code, message } if code == tether_core::ACCESS_MODE_ERROR_CODE => {
                Self::ReadOnlyViolation {
                    url: url.scrubbed(),
                    statement: statement.to_string(),
                    index: None,
                    code,
                    message,
                }
            }
            DriverError::Remote { code, message } => Self::RemoteStatementFailure {
                url: url.scrubbed(),
                statement: statement.to_string(),
                index: None,
                code: Some(code),
                message,
            },
            other => Self::RemoteStatementFailure {
                url: url.scrubbed(),
                statement: statement.to_string(),
                index: None,
                code: None,
                message: other.to_string(),
            },
        }
    }

    /// Failure while translating a record of `statement`
    pub fn from_core(url: &RemoteUrl, statement: &str, err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedVariant { column, type_name } => Self::UnsupportedVariant {
                url: url.scrubbed(),
                index: None,
                column,
                type_name,
            },
            other => Self::RemoteStatementFailure {
                url: url.scrubbed(),
                statement: statement.to_string(),
                index: None,
                code: None,
                message: other.to_string(),
            },
        }
    }

    /// Tag a remote failure with its position in a statement stream
    pub fn with_statement_index(mut self, position: usize) -> Self {
        match &mut self {
            Self::ConnectionFailure { index, .. }
            | Self::UnsupportedVariant { index, .. }
            | Self::ReadOnlyViolation { index, .. }
            | Self::RemoteStatementFailure { index, .. } => *index = Some(position),
            _ => {}
        }
        self
    }

    /// Remote error code, when the remote reported one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::ReadOnlyViolation { code, .. } => Some(code),
            Self::RemoteStatementFailure { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Position of the failed statement in a statement stream
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            Self::ConnectionFailure { index, .. }
            | Self::UnsupportedVariant { index, .. }
            | Self::ReadOnlyViolation { index, .. }
            | Self::RemoteStatementFailure { index, .. } => *index,
            Self::InvalidStatementStream { index, .. } => Some(*index),
            _ => None,
        }
    }
}
