//! Centralized error types for issuecast.

use thiserror::Error;

use crate::session::ConnectionState;

/// Main error type for issuecast operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] issuecast_db::DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Invalid connection transition: cannot move from '{from:?}' to '{to:?}'")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}

/// Result type for issuecast operations.
pub type CoreResult<T> = Result<T, CoreError>;
