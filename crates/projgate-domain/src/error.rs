//! Domain error types for access resolution.

use thiserror::Error;

/// Domain-specific errors raised while resolving project access.
///
/// None of these reach callers of the public resolver entry points; they are
/// logged and converted into an empty access set.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A collaborator query failed (connection loss, malformed data, ...).
    #[error("data access error: {message}")]
    DataAccess { message: String },

    /// A collaborator query did not complete within the configured timeout.
    #[error("{operation} timed out after {duration_ms}ms")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    /// The user identifier is empty or otherwise unusable.
    #[error("invalid user id: {value:?}")]
    InvalidUserId { value: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
