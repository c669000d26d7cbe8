//! In-memory audit sink
//!
//! Append-only store of audit entries with a retention purge. Real
//! deployments point [`AuditSink`](super::traits::AuditSink) at a
//! durable log; this implementation backs tests and single-process use.

use super::traits::AuditSink;
use crate::core::models::AuditLogEntry;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

/// In-memory append-only audit sink
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all retained entries, oldest first
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().clone()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the sink holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, entry: AuditLogEntry) -> Result<()> {
        debug!(action = %entry.action, actor = %entry.actor, "audit entry appended");
        self.entries.write().push(entry);
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.created_at >= cutoff);
        Ok(before - entries.len())
    }
}
