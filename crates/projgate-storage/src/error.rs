//! Storage error types.

use projgate_domain::model::{GroupId, ProjectId};
use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// User not found.
    #[error("user not found: {user_id}")]
    UserNotFound { user_id: String },

    /// Project not found.
    #[error("project not found: {project_id}")]
    ProjectNotFound { project_id: ProjectId },

    /// Group not found.
    #[error("group not found: {group_id}")]
    GroupNotFound { group_id: GroupId },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Database connection error.
    #[error("database connection error: {message}")]
    ConnectionError { message: String },

    /// Database query error.
    #[error("database query error: {message}")]
    QueryError { message: String },

    /// Internal error.
    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
