//! Scope matching with precedence rules
//!
//! Decides whether the scopes attached to the grants that carry a
//! permission bit satisfy the scope a caller requested. Group and owner
//! identifiers arrive pre-resolved in the request; the engine never
//! queries ownership itself.

use super::types::{Scope, ScopeSet};
use rolegate_core::GroupId;

/// Scope resolver configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeConfig {
    /// When set, the GROUP check also accepts a match against the
    /// resource group's ancestor chain (`resource_group_path`). Off by
    /// default: group matching is literal equality.
    pub nested_groups: bool,
}

/// Pre-resolved identity context for one check
#[derive(Debug, Clone, Copy)]
pub struct ScopeContext<'a> {
    /// Acting user
    pub user_id: &'a str,

    /// Groups the acting user belongs to
    pub user_groups: &'a [GroupId],

    /// Owner of the target resource, if known
    pub resource_owner: Option<&'a str>,

    /// Owning group of the target resource, if known
    pub resource_group: Option<&'a str>,

    /// Ancestor chain of the resource's group, nearest first; only
    /// consulted when `nested_groups` is enabled
    pub resource_group_path: &'a [GroupId],
}

/// Applies the containment precedence ALL ⊇ GROUP ⊇ SELF
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeResolver {
    config: ScopeConfig,
}

impl ScopeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScopeConfig) -> Self {
        Self { config }
    }

    /// Match granted scopes against a requested scope.
    ///
    /// Returns the granted scope that satisfied the request, or `None`
    /// for a scope mismatch. The requested scope's own contextual
    /// predicate always applies: SELF requires owner identity, GROUP
    /// requires group membership. A bare GROUP grant satisfying a SELF
    /// request must additionally pass the group check — granting GROUP
    /// never bypasses its own territory.
    pub fn matches(
        &self,
        granted: &ScopeSet,
        requested: &Scope,
        ctx: &ScopeContext<'_>,
    ) -> Option<Scope> {
        match requested {
            Scope::All => granted.contains(&Scope::All).then_some(Scope::All),

            Scope::Group => {
                if !self.group_matches(ctx) {
                    return None;
                }
                if granted.contains(&Scope::Group) {
                    Some(Scope::Group)
                } else if granted.contains(&Scope::All) {
                    Some(Scope::All)
                } else {
                    None
                }
            }

            Scope::Own => {
                if !owner_matches(ctx) {
                    return None;
                }
                if granted.contains(&Scope::Own) {
                    Some(Scope::Own)
                } else if granted.contains(&Scope::Group) && self.group_matches(ctx) {
                    Some(Scope::Group)
                } else if granted.contains(&Scope::All) {
                    Some(Scope::All)
                } else {
                    None
                }
            }

            Scope::Custom(_) => {
                if granted.contains(requested) {
                    Some(requested.clone())
                } else if granted.contains(&Scope::All) {
                    Some(Scope::All)
                } else {
                    None
                }
            }
        }
    }

    fn group_matches(&self, ctx: &ScopeContext<'_>) -> bool {
        let Some(resource_group) = ctx.resource_group else {
            return false;
        };
        if ctx.user_groups.iter().any(|group| group == resource_group) {
            return true;
        }
        self.config.nested_groups
            && ctx
                .resource_group_path
                .iter()
                .any(|ancestor| ctx.user_groups.contains(ancestor))
    }
}

fn owner_matches(ctx: &ScopeContext<'_>) -> bool {
    ctx.resource_owner == Some(ctx.user_id)
}
