//! Authorization request and decision value types

use crate::scope::Scope;
use chrono::{DateTime, Utc};
use rolegate_core::{GroupId, PermissionName, ResourceId, RoleId, UserId};
use serde::{Deserialize, Serialize};

/// One authorization question.
///
/// Owner and group identifiers arrive pre-resolved: the engine compares
/// them but never looks them up. `as_of` is always explicit so the
/// engine stays deterministic; [`AuthorizeRequest::now`] is the boundary
/// convenience that stamps the current time before the request enters
/// the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    /// Verified identity of the acting user
    pub user_id: UserId,

    /// Resource namespace being acted on (e.g. "invoice")
    pub resource: ResourceId,

    /// Permission name within the resource (e.g. "VIEW")
    pub action: PermissionName,

    /// Scope the caller is asserting for this access
    pub requested_scope: Scope,

    /// Owner of the concrete target, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_owner: Option<UserId>,

    /// Owning group of the concrete target, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<GroupId>,

    /// Ancestor chain of the resource's group, nearest first; consulted
    /// only when nested-group matching is enabled
    #[serde(default)]
    pub resource_group_path: Vec<GroupId>,

    /// Groups the acting user belongs to
    #[serde(default)]
    pub user_groups: Vec<GroupId>,

    /// Evaluation instant for expiry checks
    pub as_of: DateTime<Utc>,
}

impl AuthorizeRequest {
    pub fn new(
        user_id: impl Into<UserId>,
        resource: impl Into<ResourceId>,
        action: impl Into<PermissionName>,
        requested_scope: Scope,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            resource: resource.into(),
            action: action.into(),
            requested_scope,
            resource_owner: None,
            resource_group: None,
            resource_group_path: Vec::new(),
            user_groups: Vec::new(),
            as_of,
        }
    }

    /// Boundary convenience: evaluate at the current instant
    pub fn now(
        user_id: impl Into<UserId>,
        resource: impl Into<ResourceId>,
        action: impl Into<PermissionName>,
        requested_scope: Scope,
    ) -> Self {
        Self::new(user_id, resource, action, requested_scope, Utc::now())
    }

    pub fn owned_by(mut self, owner: impl Into<UserId>) -> Self {
        self.resource_owner = Some(owner.into());
        self
    }

    pub fn in_group(mut self, group: impl Into<GroupId>) -> Self {
        self.resource_group = Some(group.into());
        self
    }

    pub fn with_group_path<I, G>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupId>,
    {
        self.resource_group_path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn acting_in_groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupId>,
    {
        self.user_groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

/// Why an authorization was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The user's effective bits do not include the requested permission
    MissingPermission,

    /// The bit is granted but no granted scope satisfies the request
    ScopeMismatch,

    /// The user exists but is flagged inactive
    InactiveUser,

    /// The user is unknown or holds no effective roles at `as_of`
    NoRoles,
}

/// Outcome of an authorize call. Denial is a normal value, never an
/// error; identical inputs at the same `as_of` produce identical
/// decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    Granted {
        /// The granted scope that satisfied the request
        matched_scope: Scope,

        /// Roles whose grants actually carried the permission bit,
        /// sorted for determinism
        contributing_roles: Vec<RoleId>,
    },
    Denied {
        reason: DenyReason,
    },
}

impl Decision {
    pub fn granted(matched_scope: Scope, mut contributing_roles: Vec<RoleId>) -> Self {
        contributing_roles.sort();
        contributing_roles.dedup();
        Decision::Granted {
            matched_scope,
            contributing_roles,
        }
    }

    pub fn denied(reason: DenyReason) -> Self {
        Decision::Denied { reason }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted { .. })
    }

    /// Roles that carried the bit; empty on denial
    pub fn contributing_roles(&self) -> &[RoleId] {
        match self {
            Decision::Granted {
                contributing_roles, ..
            } => contributing_roles,
            Decision::Denied { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = AuthorizeRequest::now("u10", "invoice", "VIEW", Scope::Group)
            .owned_by("u99")
            .in_group("g1")
            .acting_in_groups(["g1", "g2"]);

        assert_eq!(request.user_id, "u10");
        assert_eq!(request.resource_owner.as_deref(), Some("u99"));
        assert_eq!(request.resource_group.as_deref(), Some("g1"));
        assert_eq!(request.user_groups.len(), 2);
    }

    #[test]
    fn test_granted_roles_sorted() {
        let decision = Decision::granted(
            Scope::All,
            vec!["zeta".to_string(), "alpha".to_string(), "zeta".to_string()],
        );
        assert_eq!(
            decision.contributing_roles(),
            &["alpha".to_string(), "zeta".to_string()]
        );
        assert!(decision.is_granted());
    }

    #[test]
    fn test_denied_has_no_roles() {
        let decision = Decision::denied(DenyReason::ScopeMismatch);
        assert!(!decision.is_granted());
        assert!(decision.contributing_roles().is_empty());
    }
}
