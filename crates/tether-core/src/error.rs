//! Error types for result materialization

use thiserror::Error;

/// A value kind the classifier has no mapping for
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported remote value type '{type_name}'")]
pub struct UnsupportedVariant {
    pub type_name: String,
}

/// Errors raised while turning remote records into rows
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unsupported remote value type '{type_name}' in column '{column}'")]
    UnsupportedVariant { column: String, type_name: String },

    #[error("Malformed path: {0}")]
    MalformedPath(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub(crate) fn in_column(column: &str, err: UnsupportedVariant) -> Self {
        Self::UnsupportedVariant {
            column: column.to_string(),
            type_name: err.type_name,
        }
    }
}
