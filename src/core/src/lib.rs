//! # Rolegate Core
//!
//! Shared identifiers, raw storage records, and the storage-provider seam
//! for the rolegate authorization engine. This package carries no engine
//! logic: it defines the shapes a persistence layer hands the engine and
//! nothing else.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::StorageProvider;
pub use types::{
    GroupId, GroupRecord, HierarchyEdgeRecord, PermissionName, PermissionRecord, ResourceId,
    RoleId, RolePermissionRecord, RoleRecord, ScopeTag, UserId, UserRecord, UserRoleRecord,
};
