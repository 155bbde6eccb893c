//! Collaborator-facing error types
//!
//! Storage providers return these; the engine wraps them into its own
//! error taxonomy at the build boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by storage providers and other collaborators
#[derive(Debug, Error)]
pub enum CoreError {
    /// Backend failure while loading records
    #[error("Storage error: {0}")]
    Storage(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record is malformed or inconsistent
    #[error("Invalid: {0}")]
    Invalid(String),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        CoreError::Storage(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        CoreError::NotFound(msg.into())
    }

    /// Create an invalid error
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        CoreError::Invalid(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let err = CoreError::storage("pool exhausted");
        assert!(matches!(err, CoreError::Storage(_)));

        let err = CoreError::not_found("role r7");
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::storage("connection refused");
        assert_eq!(err.to_string(), "Storage error: connection refused");
    }
}
