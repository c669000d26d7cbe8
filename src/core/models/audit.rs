//! Audit trail entry
//!
//! Immutable records of authorization-relevant decisions and state
//! transitions. Entries are created, appended, and eventually purged by
//! the retention sweep; they are never mutated.

use crate::auth::rbac::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome recorded on an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// One append-only audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry identifier
    pub id: String,
    /// Acting identity
    pub actor: String,
    /// Action tag, e.g. `authorize` or `application.submit`
    pub action: String,
    /// Target resource or entity
    pub resource: String,
    /// Actor's roles at the time of the action
    pub roles_at_time: Vec<Role>,
    /// Whether the action succeeded
    pub outcome: AuditOutcome,
    /// Structured context
    pub metadata: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Create an entry with empty metadata
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
        roles_at_time: Vec<Role>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            actor: actor.into(),
            action: action.into(),
            resource: resource.into(),
            roles_at_time,
            outcome,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Attach structured metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
