//! Seams to the wire-protocol driver
//!
//! The driver owns connections, pooling, encryption and retries. This crate
//! only needs a session that runs a statement and hands back records one at a
//! time.

use async_trait::async_trait;
use tether_config::{DriverConfig, RemoteUrl};
use thiserror::Error;
use tracing::debug;

use crate::value::{Params, RemoteNode, RemoteRecord, SummaryCounters};

/// Error code the remote instance reports for a write on a read session
pub const ACCESS_MODE_ERROR_CODE: &str = "Neo.ClientError.Statement.AccessMode";

/// Errors reported by a driver implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("{code}: {message}")]
    Remote { code: String, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Session is closed")]
    SessionClosed,
}

pub type DriverResult<T> = Result<T, DriverError>;

impl DriverError {
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the remote refused a write because the session is read-only
    pub fn is_access_mode_violation(&self) -> bool {
        matches!(self, Self::Remote { code, .. } if code == ACCESS_MODE_ERROR_CODE)
    }

    /// Whether the error happened before any statement could run
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Authentication(_))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Remote { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Session access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// Everything a driver needs to open one session
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub url: RemoteUrl,
    pub access_mode: AccessMode,
    /// Target database, the server default when `None`
    pub database: Option<String>,
    pub driver: DriverConfig,
}

/// Opens sessions against a remote instance
#[async_trait]
pub trait Driver: Send + Sync {
    /// Connect and authenticate. A returned session is ready to run statements.
    async fn connect(&self, request: &SessionRequest) -> DriverResult<Box<dyn RemoteSession>>;
}

/// One open session on a remote instance.
///
/// A session runs one statement at a time. Records are pulled one by one;
/// nothing is expected to be buffered ahead of `next_record` calls beyond what
/// the driver fetches per network round trip.
#[async_trait]
pub trait RemoteSession: Send {
    /// Start a statement and return its column names
    async fn run(&mut self, statement: &str, params: &Params) -> DriverResult<Vec<String>>;

    /// Next record of the running statement, `None` once exhausted
    async fn next_record(&mut self) -> DriverResult<Option<RemoteRecord>>;

    /// Discard any unread records and return the statement's write counters
    async fn consume(&mut self) -> DriverResult<SummaryCounters>;

    /// Fetch full node data by remote id. Drivers that cannot do this return
    /// nothing, and callers treat the nodes as unknown.
    ///
    /// Callers run this on a session with no open result.
    async fn lookup_nodes(&mut self, ids: &[i64]) -> DriverResult<Vec<RemoteNode>> {
        debug!(
            ids = ?ids,
            "Driver cannot resolve relationship endpoints, leaving them as placeholders"
        );
        Ok(Vec::new())
    }

    /// Release the session. Must be safe to call more than once.
    fn close(&mut self);
}
