//! Decision engine
//!
//! Orchestrates catalog lookup, the assignment index, and scope
//! resolution to answer authorize requests, with decision caching and
//! optional audit emission.
//!
//! # Architecture
//!
//! ```text
//! Request → Catalog → Assignment Index → Scope Resolver → Decision
//!              ↓             ↓                               ↓
//!           [Generation snapshot, swapped atomically]    [Cache]
//!                                                           ↓
//!                                                       [Audit sink]
//! ```
//!
//! The active generation is a single atomically-swapped immutable
//! snapshot: every authorize call clones the `Arc` once up front and
//! computes against that snapshot, so a concurrent rebuild can never
//! show it a torn mix of old and new data.

pub mod audit;
pub mod cache;
pub mod decision;

pub use audit::{AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use cache::{CacheConfig, CacheStats, DecisionCache};
pub use decision::{AuthorizeRequest, Decision, DenyReason};

use crate::error::Result;
use crate::generation::Generation;
use crate::scope::{ScopeConfig, ScopeContext, ScopeResolver, ScopeSet};
use rolegate_core::StorageProvider;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enable the decision cache
    pub enable_cache: bool,

    /// Decision cache configuration
    pub cache_config: CacheConfig,

    /// Scope matching configuration
    pub scope_config: ScopeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache_config: CacheConfig::default(),
            scope_config: ScopeConfig::default(),
        }
    }
}

/// The authorization decision engine.
///
/// Read-mostly: many concurrent `authorize` calls proceed without
/// blocking each other. All storage I/O happens inside `rebuild`.
pub struct DecisionEngine {
    storage: Arc<dyn StorageProvider>,

    /// The published generation; replaced wholesale, never edited
    generation: RwLock<Arc<Generation>>,

    scope_resolver: ScopeResolver,

    cache: Option<DecisionCache>,

    audit: Option<Arc<dyn AuditSink>>,
}

impl DecisionEngine {
    /// Build the first generation from storage and start serving it
    pub async fn new(storage: Arc<dyn StorageProvider>) -> Result<Self> {
        Self::with_config(EngineConfig::default(), storage).await
    }

    /// Create an engine with explicit configuration
    pub async fn with_config(
        config: EngineConfig,
        storage: Arc<dyn StorageProvider>,
    ) -> Result<Self> {
        let generation = Generation::load(storage.as_ref()).await?;

        let cache = if config.enable_cache {
            Some(DecisionCache::new(config.cache_config.clone()))
        } else {
            None
        };

        info!(
            roles = generation.graph().len(),
            permissions = generation.catalog().len(),
            cache = config.enable_cache,
            "decision engine initialized"
        );

        Ok(Self {
            storage,
            generation: RwLock::new(Arc::new(generation)),
            scope_resolver: ScopeResolver::with_config(config.scope_config),
            cache,
            audit: None,
        })
    }

    /// Attach an audit sink. Every decision is appended to it; append
    /// failures are logged and do not affect outcomes.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Answer one authorization question.
    ///
    /// Deterministic: the same request (including `as_of`) against the
    /// same generation always yields the same decision. The only error
    /// surfaced is `UnknownPermission` — an unregistered action name is
    /// a caller or configuration bug, not an access outcome.
    pub async fn authorize(&self, request: &AuthorizeRequest) -> Result<Decision> {
        // Snapshot the generation once; the rest of the call never sees
        // a swap
        let generation = { self.generation.read().await.clone() };

        debug!(
            user = %request.user_id,
            resource = %request.resource,
            action = %request.action,
            scope = %request.requested_scope,
            "authorize"
        );

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(request) {
                debug!("decision served from cache");
                return Ok(cached);
            }
        }

        let bit = generation.catalog().resolve(&request.resource, &request.action)?;
        let decision = self.decide(&generation, request, bit);

        info!(
            user = %request.user_id,
            resource = %request.resource,
            action = %request.action,
            granted = decision.is_granted(),
            "decision"
        );

        if let Some(sink) = &self.audit {
            let record = AuditRecord::for_decision(request, &decision);
            if let Err(e) = sink.append(record).await {
                warn!("audit append failed: {}", e);
            }
        }

        if let Some(cache) = &self.cache {
            cache.put(request, decision.clone());
        }

        Ok(decision)
    }

    /// Rebuild from storage and atomically publish the new generation.
    ///
    /// A structural error (cycle, dangling edge, duplicate bit, unknown
    /// role) aborts the build: the engine keeps serving the previously
    /// published generation and reports the failure.
    pub async fn rebuild(&self) -> Result<()> {
        match Generation::load(self.storage.as_ref()).await {
            Ok(generation) => {
                let fresh = Arc::new(generation);
                {
                    let mut published = self.generation.write().await;
                    *published = fresh;
                }
                if let Some(cache) = &self.cache {
                    cache.clear();
                }
                info!("new generation published");
                Ok(())
            }
            Err(e) => {
                error!("generation build failed, keeping last good generation: {}", e);
                Err(e)
            }
        }
    }

    /// The currently published generation snapshot
    pub async fn current_generation(&self) -> Arc<Generation> {
        self.generation.read().await.clone()
    }

    /// Decision cache statistics, if the cache is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(DecisionCache::stats)
    }

    fn decide(&self, generation: &Generation, request: &AuthorizeRequest, bit: u64) -> Decision {
        match generation.user_active(&request.user_id) {
            Some(true) => {}
            Some(false) => return Decision::denied(DenyReason::InactiveUser),
            None => return Decision::denied(DenyReason::NoRoles),
        }

        let contributions =
            generation.contributions(&request.user_id, &request.resource, request.as_of);
        if contributions.is_empty()
            && generation
                .effective_roles(&request.user_id, request.as_of)
                .is_empty()
        {
            return Decision::denied(DenyReason::NoRoles);
        }

        // Only grants that actually carry the bit supply scopes; a
        // SELF-scoped grant of one bit must not widen an unrelated bit
        let mut granted_scopes = ScopeSet::new();
        let mut carriers = Vec::new();
        for contribution in &contributions {
            if contribution.bits & bit != 0 {
                granted_scopes.union_with(&contribution.scopes);
                carriers.push(contribution.role.clone());
            }
        }

        if carriers.is_empty() {
            let held = contributions
                .iter()
                .fold(0u64, |acc, contribution| acc | contribution.bits);
            debug!(
                user = %request.user_id,
                held = ?generation.catalog().names(&request.resource, held),
                missing = %request.action,
                "permission bit not held"
            );
            return Decision::denied(DenyReason::MissingPermission);
        }

        let context = ScopeContext {
            user_id: &request.user_id,
            user_groups: &request.user_groups,
            resource_owner: request.resource_owner.as_deref(),
            resource_group: request.resource_group.as_deref(),
            resource_group_path: &request.resource_group_path,
        };

        match self
            .scope_resolver
            .matches(&granted_scopes, &request.requested_scope, &context)
        {
            Some(matched_scope) => Decision::granted(matched_scope, carriers),
            None => Decision::denied(DenyReason::ScopeMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use rolegate_core::{
        PermissionRecord, RolePermissionRecord, RoleRecord, UserRecord, UserRoleRecord,
    };

    async fn storage() -> Arc<MemoryStorage> {
        let storage = MemoryStorage::new();
        storage.insert_user(UserRecord::new("u1")).await;
        storage.insert_role(RoleRecord::new("viewer", "Viewer")).await;
        storage
            .insert_permission(PermissionRecord::new("doc", 0x1, "VIEW"))
            .await;
        storage
            .insert_role_permission(RolePermissionRecord::new("viewer", "doc", 0x1))
            .await;
        storage.insert_user_role(UserRoleRecord::new("u1", "viewer")).await;
        Arc::new(storage)
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let engine = DecisionEngine::new(storage().await).await.unwrap();
        assert!(engine.cache_stats().is_some());
    }

    #[tokio::test]
    async fn test_cache_can_be_disabled() {
        let config = EngineConfig {
            enable_cache: false,
            ..Default::default()
        };
        let engine = DecisionEngine::with_config(config, storage().await)
            .await
            .unwrap();
        assert!(engine.cache_stats().is_none());
    }
}
