//! Audit sink for authorization decisions
//!
//! The engine emits one structured record per decision to an optional
//! collaborator. The sink only needs a write-once append; storage format
//! and retention are its own business. Audit failures are logged and
//! never affect the decision.

use super::decision::{AuthorizeRequest, Decision};
use crate::scope::Scope;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rolegate_core::{PermissionName, ResourceId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// One decision, flattened for append-only consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record identifier
    pub id: String,

    pub user_id: UserId,
    pub resource: ResourceId,
    pub action: PermissionName,
    pub requested_scope: Scope,

    /// The full decision value
    pub outcome: Decision,

    /// Roles that carried the bit; empty on denial
    pub contributing_roles: Vec<RoleId>,

    /// Evaluation instant the decision was computed against
    pub as_of: DateTime<Utc>,
}

impl AuditRecord {
    pub fn for_decision(request: &AuthorizeRequest, decision: &Decision) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id.clone(),
            resource: request.resource.clone(),
            action: request.action.clone(),
            requested_scope: request.requested_scope.clone(),
            outcome: decision.clone(),
            contributing_roles: decision.contributing_roles().to_vec(),
            as_of: request.as_of,
        }
    }
}

/// Append-only decision log collaborator
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, record: AuditRecord) -> rolegate_core::Result<()>;
}

/// In-process sink collecting records in memory; useful in tests and
/// embedded deployments
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: AuditRecord) -> rolegate_core::Result<()> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

/// Sink that emits each record as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl TracingAuditSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn append(&self, record: AuditRecord) -> rolegate_core::Result<()> {
        let payload = serde_json::to_string(&record)
            .map_err(|e| rolegate_core::CoreError::invalid(e.to_string()))?;
        info!(target: "rolegate::audit", decision = %payload);
        Ok(())
    }
}
