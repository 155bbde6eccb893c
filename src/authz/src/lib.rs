//! # Rolegate Authorization Engine
//!
//! Grants or denies actions on resources from a user's aggregated roles,
//! a role-inheritance hierarchy, bitmask-encoded permissions, and
//! contextual scopes (own data, group, everything).
//!
//! ## Features
//!
//! - **Transitive role inheritance** over a cycle-checked DAG with
//!   closures memoized at load time
//! - **Bitmask permissions** with one independent 64-bit namespace per
//!   resource
//! - **Scope precedence** (ALL ⊇ GROUP ⊇ SELF, plus custom tags) with
//!   unscoped legacy grants treated as maximally permissive
//! - **Time-bounded assignments** honoring `expires_at` without
//!   revocation writes
//! - **Generation swapping** so concurrent authorize calls always observe
//!   one consistent snapshot
//! - **Decision caching** keyed by a BLAKE3 hash of the full request
//!
//! ## Example
//!
//! ```no_run
//! use rolegate_authz::{AuthorizeRequest, DecisionEngine, MemoryStorage, Scope};
//! use rolegate_core::{PermissionRecord, RolePermissionRecord, RoleRecord, UserRecord, UserRoleRecord};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(MemoryStorage::new());
//!     storage.insert_user(UserRecord::new("u10")).await;
//!     storage.insert_role(RoleRecord::new("clerk", "Billing clerk")).await;
//!     storage.insert_permission(PermissionRecord::new("invoice", 0x1, "VIEW")).await;
//!     storage
//!         .insert_role_permission(RolePermissionRecord::new("clerk", "invoice", 0x1).with_scope("GROUP"))
//!         .await;
//!     storage.insert_user_role(UserRoleRecord::new("u10", "clerk")).await;
//!
//!     let engine = DecisionEngine::new(storage).await?;
//!
//!     let request = AuthorizeRequest::now("u10", "invoice", "VIEW", Scope::Group)
//!         .in_group("g1")
//!         .acting_in_groups(["g1"]);
//!
//!     let decision = engine.authorize(&request).await?;
//!     if decision.is_granted() {
//!         println!("access granted");
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod engine;
pub mod error;
pub mod generation;
pub mod graph;
pub mod index;
pub mod scope;
pub mod storage;

// Re-export commonly used types
pub use catalog::PermissionCatalog;
pub use engine::{
    AuditRecord, AuditSink, AuthorizeRequest, CacheConfig, Decision, DecisionEngine, DenyReason,
    EngineConfig, MemoryAuditSink, TracingAuditSink,
};
pub use error::{AuthzError, Result};
pub use generation::{Generation, GenerationBuilder};
pub use graph::RoleGraph;
pub use index::{AssignmentIndex, RoleContribution};
pub use scope::{Scope, ScopeConfig, ScopeContext, ScopeResolver, ScopeSet};
pub use storage::MemoryStorage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
