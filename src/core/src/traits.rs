//! Storage provider seam
//!
//! The engine depends only on these record-returning loads, not on any
//! query language or transport. All calls happen during generation
//! (re)build, never on the authorize hot path.

use crate::error::Result;
use crate::types::{
    GroupRecord, HierarchyEdgeRecord, PermissionRecord, RolePermissionRecord, RoleRecord,
    UserRecord, UserRoleRecord,
};
use async_trait::async_trait;

/// Supplies the raw rows a generation is built from
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// All user rows
    async fn load_users(&self) -> Result<Vec<UserRecord>>;

    /// All role rows
    async fn load_roles(&self) -> Result<Vec<RoleRecord>>;

    /// All parent→child inheritance edges
    async fn load_hierarchy_edges(&self) -> Result<Vec<HierarchyEdgeRecord>>;

    /// The permission vocabulary: (resource, bit, name) rows
    async fn load_permissions(&self) -> Result<Vec<PermissionRecord>>;

    /// Role→permission bindings including their scope rows
    async fn load_role_permissions(&self) -> Result<Vec<RolePermissionRecord>>;

    /// Every user→role binding, expired ones included
    async fn load_user_roles(&self) -> Result<Vec<UserRoleRecord>>;

    /// Group rows; only consulted by deployments that resolve GROUP scope
    /// through the engine's caller
    async fn load_groups(&self) -> Result<Vec<GroupRecord>> {
        Ok(Vec::new())
    }
}
