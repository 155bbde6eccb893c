//! Raw record types supplied by a storage provider
//!
//! These are the plain rows the engine builds a generation from. They own
//! no behavior beyond construction helpers; all validation (bit
//! uniqueness, dangling references, hierarchy cycles) happens in the
//! engine at build time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier
pub type UserId = String;

/// Role identifier
pub type RoleId = String;

/// Resource identifier (one bitmask namespace per resource)
pub type ResourceId = String;

/// Group identifier, used only for GROUP-scope resolution
pub type GroupId = String;

/// Human-readable permission name within a resource (e.g. "VIEW")
pub type PermissionName = String;

/// Scope tag as stored: "SELF", "GROUP", "ALL", or a custom tag
pub type ScopeTag = String;

/// A user row. The engine treats identity as immutable and only reads the
/// active flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Identity key (e.g. "u10")
    pub id: UserId,

    /// Inactive users resolve to no roles at all
    pub active: bool,

    /// Reference to the owning entity (person, service), opaque here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_ref: Option<String>,
}

impl UserRecord {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            active: true,
            entity_ref: None,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A role row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Unique role key (e.g. "billing-clerk")
    pub id: RoleId,

    /// Display name
    pub name: String,

    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RoleRecord {
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A directed inheritance edge: the child inherits every permission of the
/// parent, transitively. The full relation must form a DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEdgeRecord {
    pub parent: RoleId,
    pub child: RoleId,
}

impl HierarchyEdgeRecord {
    pub fn new(parent: impl Into<RoleId>, child: impl Into<RoleId>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// One permission slot: a power-of-two bit within the resource's mask,
/// paired with its human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub resource: ResourceId,

    /// Power-of-two bit value, unique within the resource
    pub bit: u64,

    pub name: PermissionName,
}

impl PermissionRecord {
    pub fn new(resource: impl Into<ResourceId>, bit: u64, name: impl Into<PermissionName>) -> Self {
        Self {
            resource: resource.into(),
            bit,
            name: name.into(),
        }
    }
}

/// Binding of a role to permission bits on one resource, with zero or more
/// scope rows. An empty scope list is an unscoped legacy grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionRecord {
    pub role: RoleId,

    pub resource: ResourceId,

    /// OR of the granted permission bits
    pub bits: u64,

    /// Scope rows attached to this binding ("SELF", "GROUP", "ALL", custom)
    #[serde(default)]
    pub scopes: Vec<ScopeTag>,
}

impl RolePermissionRecord {
    pub fn new(role: impl Into<RoleId>, resource: impl Into<ResourceId>, bits: u64) -> Self {
        Self {
            role: role.into(),
            resource: resource.into(),
            bits,
            scopes: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<ScopeTag>) -> Self {
        self.scopes.push(scope.into());
        self
    }
}

/// Binding of a user to a role, optionally time-bounded. An elapsed
/// `expires_at` makes the binding inert; it is never deleted, so history
/// survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleRecord {
    pub user: UserId,

    pub role: RoleId,

    /// Exclusive upper bound: the binding is expired from this instant on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserRoleRecord {
    pub fn new(user: impl Into<UserId>, role: impl Into<RoleId>) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
            expires_at: None,
        }
    }

    pub fn expiring(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Whether the binding still grants its role at `as_of`
    pub fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry > as_of,
        }
    }
}

/// Organizational grouping of users, consumed only by GROUP-scope checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,

    pub name: String,

    /// Parent category, if the deployment nests groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<GroupId>,
}

impl GroupRecord {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
        }
    }
}
