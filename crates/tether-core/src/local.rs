//! Seam to the local query engine

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::value::Params;

/// Errors from the local engine, passed through untouched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalQueryError {
    #[error("Local statement failed: {0}")]
    Statement(String),

    #[error("Local result stream failed: {0}")]
    Stream(String),
}

/// Lazily produced local rows, column name to value
pub type LocalRowStream = BoxStream<'static, Result<Params, LocalQueryError>>;

/// Runs statements against the local database
#[async_trait]
pub trait LocalQueryEngine: Send + Sync {
    async fn run(&self, statement: &str, params: &Params) -> Result<LocalRowStream, LocalQueryError>;
}
