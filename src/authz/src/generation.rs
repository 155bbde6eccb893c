//! Immutable data generations
//!
//! One generation bundles everything a decision needs: the permission
//! catalog, the cycle-checked role graph, the role→grant tables, and the
//! per-user assignment index. A generation is fully validated before it
//! can exist; once published it is never edited, only replaced.

use crate::catalog::PermissionCatalog;
use crate::error::Result;
use crate::graph::RoleGraph;
use crate::index::{AssignmentIndex, Grant, GrantTable, RoleContribution};
use crate::scope::ScopeSet;
use chrono::{DateTime, Utc};
use rolegate_core::{
    HierarchyEdgeRecord, PermissionRecord, RoleId, RolePermissionRecord, RoleRecord,
    StorageProvider, UserRecord, UserRoleRecord,
};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// One immutable, fully-built snapshot of catalog + graph + assignments
#[derive(Debug)]
pub struct Generation {
    catalog: PermissionCatalog,
    graph: RoleGraph,
    grants: GrantTable,
    index: AssignmentIndex,
}

impl Generation {
    /// Load all rows from a storage provider and build a generation.
    /// This is the only place the engine touches I/O; it never runs on
    /// the authorize path.
    pub async fn load(storage: &dyn StorageProvider) -> Result<Generation> {
        let users = storage.load_users().await?;
        let roles = storage.load_roles().await?;
        let edges = storage.load_hierarchy_edges().await?;
        let permissions = storage.load_permissions().await?;
        let role_permissions = storage.load_role_permissions().await?;
        let user_roles = storage.load_user_roles().await?;

        GenerationBuilder::from_records(
            users,
            roles,
            edges,
            permissions,
            role_permissions,
            user_roles,
        )
        .build()
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn graph(&self) -> &RoleGraph {
        &self.graph
    }

    /// Whether the user exists and is active; `None` for unknown users
    pub fn user_active(&self, user: &str) -> Option<bool> {
        self.index.user_active(user)
    }

    /// All roles effective for the user at `as_of`, closure included
    pub fn effective_roles(&self, user: &str, as_of: DateTime<Utc>) -> BTreeSet<RoleId> {
        self.index.effective_roles(&self.graph, user, as_of)
    }

    /// Effective permission bits and the union of contributing scopes
    pub fn permission_bits(
        &self,
        user: &str,
        resource: &str,
        as_of: DateTime<Utc>,
    ) -> (u64, ScopeSet) {
        self.index
            .permission_bits(&self.graph, &self.grants, user, resource, as_of)
    }

    /// Per-role grant breakdown for (user, resource) at `as_of`
    pub fn contributions(
        &self,
        user: &str,
        resource: &str,
        as_of: DateTime<Utc>,
    ) -> Vec<RoleContribution> {
        self.index
            .contributions(&self.graph, &self.grants, user, resource, as_of)
    }
}

/// Assembles and validates a generation from raw records
#[derive(Debug, Default)]
pub struct GenerationBuilder {
    users: Vec<UserRecord>,
    roles: Vec<RoleRecord>,
    edges: Vec<HierarchyEdgeRecord>,
    permissions: Vec<PermissionRecord>,
    role_permissions: Vec<RolePermissionRecord>,
    user_roles: Vec<UserRoleRecord>,
}

impl GenerationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(
        users: Vec<UserRecord>,
        roles: Vec<RoleRecord>,
        edges: Vec<HierarchyEdgeRecord>,
        permissions: Vec<PermissionRecord>,
        role_permissions: Vec<RolePermissionRecord>,
        user_roles: Vec<UserRoleRecord>,
    ) -> Self {
        Self {
            users,
            roles,
            edges,
            permissions,
            role_permissions,
            user_roles,
        }
    }

    pub fn user(mut self, record: UserRecord) -> Self {
        self.users.push(record);
        self
    }

    pub fn role(mut self, record: RoleRecord) -> Self {
        self.roles.push(record);
        self
    }

    pub fn edge(mut self, record: HierarchyEdgeRecord) -> Self {
        self.edges.push(record);
        self
    }

    pub fn permission(mut self, record: PermissionRecord) -> Self {
        self.permissions.push(record);
        self
    }

    pub fn role_permission(mut self, record: RolePermissionRecord) -> Self {
        self.role_permissions.push(record);
        self
    }

    pub fn user_role(mut self, record: UserRoleRecord) -> Self {
        self.user_roles.push(record);
        self
    }

    /// Validate every structural invariant and assemble the snapshot.
    ///
    /// # Errors
    ///
    /// `DuplicateBitAssignment`, `DuplicateRole`, `DanglingEdge`,
    /// `CyclicHierarchy`, `UnknownRole`, or `InvalidScope` — any of which
    /// must prevent the generation from ever being published.
    pub fn build(self) -> Result<Generation> {
        let catalog = PermissionCatalog::load(&self.permissions)?;
        let graph = RoleGraph::load(self.roles, &self.edges)?;

        let mut grants: GrantTable = HashMap::new();
        for record in &self.role_permissions {
            let role = graph.index_of(&record.role)?;
            let scopes = ScopeSet::from_tags(&record.scopes)?;
            grants
                .entry(role)
                .or_default()
                .entry(record.resource.clone())
                .or_default()
                .push(Grant {
                    bits: record.bits,
                    scopes,
                });
        }

        let index = AssignmentIndex::build(&self.users, &self.user_roles, &graph)?;

        debug!(
            roles = graph.len(),
            permissions = catalog.len(),
            users = self.users.len(),
            "generation built"
        );

        Ok(Generation {
            catalog,
            graph,
            grants,
            index,
        })
    }
}
