//! Common error types for reelfeed

use thiserror::Error;

use crate::models::Role;

/// Common result type for reelfeed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the storage layers and feed synchronizers
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid user input, rejected before any store call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation restricted to accounts with a specific role
    #[error("Requires {0} role")]
    RoleRequired(Role),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
