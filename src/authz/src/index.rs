//! Per-user assignment index
//!
//! Materializes, per user, the permission grants reachable through their
//! direct role bindings and the role-graph closure. Built lazily against
//! one generation's immutable data; the `(user, resource)` cache entries
//! are inserted whole and never edited, so concurrent readers never see a
//! half-built entry. Expiry is applied at query time against the caller's
//! `as_of`, which keeps one cached entry valid for every point in time.

use crate::graph::RoleGraph;
use crate::scope::ScopeSet;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rolegate_core::{ResourceId, RoleId, UserId, UserRecord, UserRoleRecord};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// One grant a role carries for a resource, as contributed to a user's
/// effective permissions. Retained per role so the engine can report
/// which roles actually carried a bit and which scopes those carriers
/// attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleContribution {
    pub role: RoleId,
    pub bits: u64,
    pub scopes: ScopeSet,
}

/// Grant rows for one role, keyed by resource. Separate rows stay
/// separate: merging them would let one row's scopes widen another row's
/// bits.
pub(crate) type GrantTable = HashMap<usize, HashMap<ResourceId, Vec<Grant>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Grant {
    pub bits: u64,
    pub scopes: ScopeSet,
}

/// A user's direct role binding, by arena index
#[derive(Debug, Clone)]
struct DirectBinding {
    role: usize,
    expires_at: Option<DateTime<Utc>>,
}

impl DirectBinding {
    fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry > as_of,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct UserAssignments {
    active: bool,
    bindings: Vec<DirectBinding>,
}

/// Contributions of one direct binding for one resource, cached with the
/// binding's expiry so any `as_of` can be answered from the same entry
#[derive(Debug)]
struct BindingContributions {
    expires_at: Option<DateTime<Utc>>,
    contributions: Vec<RoleContribution>,
}

impl BindingContributions {
    fn is_active(&self, as_of: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry > as_of,
        }
    }
}

/// Per-user materialized view of role assignments and permission grants
#[derive(Debug, Default)]
pub struct AssignmentIndex {
    users: HashMap<UserId, UserAssignments>,

    /// Lazily filled per (user, resource); dropped wholesale with the
    /// generation that owns it
    cache: DashMap<(UserId, ResourceId), Arc<Vec<BindingContributions>>>,
}

impl AssignmentIndex {
    /// Build the direct-binding tables. Bindings whose role is unknown
    /// must already have been rejected by the generation builder;
    /// bindings for users missing from the user table grant nothing and
    /// are dropped with a warning.
    pub(crate) fn build(
        users: &[UserRecord],
        user_roles: &[UserRoleRecord],
        graph: &RoleGraph,
    ) -> crate::error::Result<Self> {
        let mut table: HashMap<UserId, UserAssignments> = users
            .iter()
            .map(|user| {
                (
                    user.id.clone(),
                    UserAssignments {
                        active: user.active,
                        bindings: Vec::new(),
                    },
                )
            })
            .collect();

        for record in user_roles {
            let role = graph.index_of(&record.role)?;
            match table.get_mut(&record.user) {
                Some(assignments) => assignments.bindings.push(DirectBinding {
                    role,
                    expires_at: record.expires_at,
                }),
                None => {
                    warn!(
                        user = %record.user,
                        role = %record.role,
                        "dropping role binding for unknown user"
                    );
                }
            }
        }

        Ok(Self {
            users: table,
            cache: DashMap::new(),
        })
    }

    /// Whether the user exists and is active. `None` for unknown users.
    pub fn user_active(&self, user: &str) -> Option<bool> {
        self.users.get(user).map(|assignments| assignments.active)
    }

    /// All roles effective for the user at `as_of`: direct non-expired
    /// roles expanded through the hierarchy closure. Inactive users have
    /// no effective roles.
    pub fn effective_roles(
        &self,
        graph: &RoleGraph,
        user: &str,
        as_of: DateTime<Utc>,
    ) -> BTreeSet<RoleId> {
        let mut roles = BTreeSet::new();
        let Some(assignments) = self.users.get(user) else {
            return roles;
        };
        if !assignments.active {
            return roles;
        }
        for binding in &assignments.bindings {
            if !binding.is_active(as_of) {
                continue;
            }
            roles.insert(graph.role_id(binding.role).clone());
            for &ancestor in graph.ancestor_indices(binding.role) {
                roles.insert(graph.role_id(ancestor).clone());
            }
        }
        roles
    }

    /// Per-role grant contributions for (user, resource) at `as_of`.
    /// A role reachable through several bindings contributes once.
    pub(crate) fn contributions(
        &self,
        graph: &RoleGraph,
        grants: &GrantTable,
        user: &str,
        resource: &str,
        as_of: DateTime<Utc>,
    ) -> Vec<RoleContribution> {
        match self.users.get(user) {
            Some(assignments) if assignments.active => {}
            _ => return Vec::new(),
        }

        let cached = self.cached_entry(graph, grants, user, resource);

        let mut merged = Vec::new();
        let mut seen: HashSet<RoleId> = HashSet::new();
        for binding in cached.iter() {
            if !binding.is_active(as_of) {
                continue;
            }
            let mut added = Vec::new();
            for contribution in &binding.contributions {
                if seen.contains(&contribution.role) {
                    continue;
                }
                added.push(contribution.role.clone());
                merged.push(contribution.clone());
            }
            seen.extend(added);
        }
        merged
    }

    /// Effective bits and the union of the contributing scopes for
    /// (user, resource) at `as_of`
    pub(crate) fn permission_bits(
        &self,
        graph: &RoleGraph,
        grants: &GrantTable,
        user: &str,
        resource: &str,
        as_of: DateTime<Utc>,
    ) -> (u64, ScopeSet) {
        let mut bits = 0u64;
        let mut scopes = ScopeSet::new();
        for contribution in self.contributions(graph, grants, user, resource, as_of) {
            bits |= contribution.bits;
            scopes.union_with(&contribution.scopes);
        }
        (bits, scopes)
    }

    /// Number of cached (user, resource) entries
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    fn cached_entry(
        &self,
        graph: &RoleGraph,
        grants: &GrantTable,
        user: &str,
        resource: &str,
    ) -> Arc<Vec<BindingContributions>> {
        let key = (user.to_string(), resource.to_string());
        if let Some(entry) = self.cache.get(&key) {
            return entry.clone();
        }

        let built = Arc::new(self.build_entry(graph, grants, user, resource));
        // A racing fill computes the same value from the same immutable
        // generation data, so either insert winning is correct
        self.cache.insert(key, built.clone());
        built
    }

    fn build_entry(
        &self,
        graph: &RoleGraph,
        grants: &GrantTable,
        user: &str,
        resource: &str,
    ) -> Vec<BindingContributions> {
        let Some(assignments) = self.users.get(user) else {
            return Vec::new();
        };

        let mut entries = Vec::with_capacity(assignments.bindings.len());
        for binding in &assignments.bindings {
            let mut contributions = Vec::new();
            let closure = std::iter::once(binding.role)
                .chain(graph.ancestor_indices(binding.role).iter().copied());
            for role in closure {
                let Some(role_grants) = grants.get(&role).and_then(|table| table.get(resource))
                else {
                    continue;
                };
                for grant in role_grants {
                    contributions.push(RoleContribution {
                        role: graph.role_id(role).clone(),
                        bits: grant.bits,
                        scopes: grant.scopes.clone(),
                    });
                }
            }
            entries.push(BindingContributions {
                expires_at: binding.expires_at,
                contributions,
            });
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use chrono::TimeZone;
    use rolegate_core::{HierarchyEdgeRecord, RoleRecord};

    fn fixture() -> (RoleGraph, GrantTable) {
        let graph = RoleGraph::load(
            vec![
                RoleRecord::new("staff", "Staff"),
                RoleRecord::new("senior", "Senior"),
            ],
            &[HierarchyEdgeRecord::new("staff", "senior")],
        )
        .unwrap();

        let mut grants: GrantTable = HashMap::new();
        let staff = graph.index_of("staff").unwrap();
        grants.entry(staff).or_default().insert(
            "invoice".to_string(),
            vec![Grant {
                bits: 0x1,
                scopes: ScopeSet::from_iter([Scope::Group]),
            }],
        );
        let senior = graph.index_of("senior").unwrap();
        grants.entry(senior).or_default().insert(
            "invoice".to_string(),
            vec![Grant {
                bits: 0x2,
                scopes: ScopeSet::from_iter([Scope::All]),
            }],
        );
        (graph, grants)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_inherited_bits_aggregate() {
        let (graph, grants) = fixture();
        let index = AssignmentIndex::build(
            &[UserRecord::new("u1")],
            &[UserRoleRecord::new("u1", "senior")],
            &graph,
        )
        .unwrap();

        let (bits, scopes) = index.permission_bits(&graph, &grants, "u1", "invoice", at(100));
        assert_eq!(bits, 0x3);
        assert!(scopes.contains(&Scope::Group));
        assert!(scopes.contains(&Scope::All));

        let roles = index.effective_roles(&graph, "u1", at(100));
        assert_eq!(
            roles,
            BTreeSet::from(["staff".to_string(), "senior".to_string()])
        );
    }

    #[test]
    fn test_expired_binding_contributes_nothing() {
        let (graph, grants) = fixture();
        let index = AssignmentIndex::build(
            &[UserRecord::new("u1")],
            &[UserRoleRecord::new("u1", "senior").expiring(at(100))],
            &graph,
        )
        .unwrap();

        // Exclusive bound: expired exactly at expires_at
        let (bits, _) = index.permission_bits(&graph, &grants, "u1", "invoice", at(100));
        assert_eq!(bits, 0);
        assert!(index.effective_roles(&graph, "u1", at(100)).is_empty());

        // One unit earlier still grants
        let (bits, _) = index.permission_bits(&graph, &grants, "u1", "invoice", at(99));
        assert_eq!(bits, 0x3);
    }

    #[test]
    fn test_overlapping_bindings_dedup_roles() {
        let (graph, grants) = fixture();
        let index = AssignmentIndex::build(
            &[UserRecord::new("u1")],
            &[
                UserRoleRecord::new("u1", "senior"),
                UserRoleRecord::new("u1", "staff"),
            ],
            &graph,
        )
        .unwrap();

        let contributions = index.contributions(&graph, &grants, "u1", "invoice", at(0));
        let staff_entries = contributions
            .iter()
            .filter(|c| c.role == "staff")
            .count();
        assert_eq!(staff_entries, 1);
    }

    #[test]
    fn test_mixed_expiries_keep_live_binding() {
        let (graph, grants) = fixture();
        // senior expires, a permanent staff binding stays
        let index = AssignmentIndex::build(
            &[UserRecord::new("u1")],
            &[
                UserRoleRecord::new("u1", "senior").expiring(at(50)),
                UserRoleRecord::new("u1", "staff"),
            ],
            &graph,
        )
        .unwrap();

        let (bits, _) = index.permission_bits(&graph, &grants, "u1", "invoice", at(60));
        assert_eq!(bits, 0x1);
        let roles = index.effective_roles(&graph, "u1", at(60));
        assert_eq!(roles, BTreeSet::from(["staff".to_string()]));
    }

    #[test]
    fn test_inactive_user_has_nothing() {
        let (graph, grants) = fixture();
        let index = AssignmentIndex::build(
            &[UserRecord::new("u1").inactive()],
            &[UserRoleRecord::new("u1", "senior")],
            &graph,
        )
        .unwrap();

        assert_eq!(index.user_active("u1"), Some(false));
        let (bits, _) = index.permission_bits(&graph, &grants, "u1", "invoice", at(0));
        assert_eq!(bits, 0);
    }

    #[test]
    fn test_unknown_user() {
        let (graph, grants) = fixture();
        let index = AssignmentIndex::build(&[], &[], &graph).unwrap();

        assert_eq!(index.user_active("ghost"), None);
        let (bits, _) = index.permission_bits(&graph, &grants, "ghost", "invoice", at(0));
        assert_eq!(bits, 0);
    }

    #[test]
    fn test_unknown_role_binding_rejected() {
        let (graph, _) = fixture();
        let result = AssignmentIndex::build(
            &[UserRecord::new("u1")],
            &[UserRoleRecord::new("u1", "ghost")],
            &graph,
        );
        assert!(matches!(result, Err(crate::AuthzError::UnknownRole(_))));
    }

    #[test]
    fn test_cache_fills_once_per_pair() {
        let (graph, grants) = fixture();
        let index = AssignmentIndex::build(
            &[UserRecord::new("u1")],
            &[UserRoleRecord::new("u1", "senior")],
            &graph,
        )
        .unwrap();

        assert_eq!(index.cached_entries(), 0);
        index.permission_bits(&graph, &grants, "u1", "invoice", at(0));
        index.permission_bits(&graph, &grants, "u1", "invoice", at(500));
        assert_eq!(index.cached_entries(), 1);
    }
}
