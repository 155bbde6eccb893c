//! In-memory storage provider
//!
//! Backs the engine in tests and embedded deployments. Real deployments
//! implement `StorageProvider` over their own persistence and hand the
//! engine the same plain records.

use async_trait::async_trait;
use rolegate_core::{
    GroupRecord, HierarchyEdgeRecord, PermissionRecord, RolePermissionRecord, RoleRecord,
    StorageProvider, UserRecord, UserRoleRecord,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserRecord>,
    roles: Vec<RoleRecord>,
    edges: Vec<HierarchyEdgeRecord>,
    permissions: Vec<PermissionRecord>,
    role_permissions: Vec<RolePermissionRecord>,
    user_roles: Vec<UserRoleRecord>,
    groups: Vec<GroupRecord>,
}

/// In-memory record tables
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, record: UserRecord) {
        self.tables.write().await.users.push(record);
    }

    pub async fn insert_role(&self, record: RoleRecord) {
        self.tables.write().await.roles.push(record);
    }

    pub async fn insert_edge(&self, record: HierarchyEdgeRecord) {
        self.tables.write().await.edges.push(record);
    }

    pub async fn insert_permission(&self, record: PermissionRecord) {
        self.tables.write().await.permissions.push(record);
    }

    pub async fn insert_role_permission(&self, record: RolePermissionRecord) {
        self.tables.write().await.role_permissions.push(record);
    }

    pub async fn insert_user_role(&self, record: UserRoleRecord) {
        self.tables.write().await.user_roles.push(record);
    }

    pub async fn insert_group(&self, record: GroupRecord) {
        self.tables.write().await.groups.push(record);
    }

    /// Drop every row; used by tests that rebuild from scratch
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn load_users(&self) -> rolegate_core::Result<Vec<UserRecord>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn load_roles(&self) -> rolegate_core::Result<Vec<RoleRecord>> {
        Ok(self.tables.read().await.roles.clone())
    }

    async fn load_hierarchy_edges(&self) -> rolegate_core::Result<Vec<HierarchyEdgeRecord>> {
        Ok(self.tables.read().await.edges.clone())
    }

    async fn load_permissions(&self) -> rolegate_core::Result<Vec<PermissionRecord>> {
        Ok(self.tables.read().await.permissions.clone())
    }

    async fn load_role_permissions(&self) -> rolegate_core::Result<Vec<RolePermissionRecord>> {
        Ok(self.tables.read().await.role_permissions.clone())
    }

    async fn load_user_roles(&self) -> rolegate_core::Result<Vec<UserRoleRecord>> {
        Ok(self.tables.read().await.user_roles.clone())
    }

    async fn load_groups(&self) -> rolegate_core::Result<Vec<GroupRecord>> {
        Ok(self.tables.read().await.groups.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let storage = MemoryStorage::new();
        storage.insert_role(RoleRecord::new("viewer", "Viewer")).await;
        storage
            .insert_permission(PermissionRecord::new("doc", 0x1, "VIEW"))
            .await;

        assert_eq!(storage.load_roles().await.unwrap().len(), 1);
        assert_eq!(storage.load_permissions().await.unwrap().len(), 1);
        assert!(storage.load_user_roles().await.unwrap().is_empty());

        storage.clear().await;
        assert!(storage.load_roles().await.unwrap().is_empty());
    }
}
