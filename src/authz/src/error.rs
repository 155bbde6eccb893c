//! Error types for the authorization engine
//!
//! Structural errors are detected while building a generation and are
//! fatal to that build only; the engine keeps serving the last good
//! generation. Ordinary denial is never an error — it is a `Decision`
//! value.

use thiserror::Error;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The role hierarchy contains a cycle; the message carries the path
    #[error("Cyclic role hierarchy: {0}")]
    CyclicHierarchy(String),

    /// A hierarchy edge references a role that does not exist
    #[error("Hierarchy edge references unknown role: {parent} -> {child}")]
    DanglingEdge { parent: String, child: String },

    /// A role id appears more than once in the role table
    #[error("Duplicate role: {0}")]
    DuplicateRole(String),

    /// A permission bit is invalid, already taken, or out of capacity
    /// for its resource
    #[error("Duplicate bit assignment: {0}")]
    DuplicateBitAssignment(String),

    /// The (resource, permission name) pair was never registered.
    /// Surfaced from `authorize` as well, since it indicates a caller or
    /// configuration bug rather than an access outcome.
    #[error("Unknown permission '{name}' on resource '{resource}'")]
    UnknownPermission { resource: String, name: String },

    /// A role-permission or user-role record references an unknown role
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A scope row could not be parsed
    #[error("Invalid scope tag: {0}")]
    InvalidScope(String),

    /// Storage provider failure while loading generation inputs
    #[error("Storage error: {0}")]
    Storage(#[from] rolegate_core::CoreError),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
