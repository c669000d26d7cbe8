//! Storage layer
//!
//! Boundary traits for identity, applications, blobs, and the audit
//! trail, plus in-memory reference implementations.

pub mod audit;
pub mod blobs;
pub mod memory;
pub mod traits;

pub use audit::MemoryAuditSink;
pub use blobs::MemoryBlobStore;
pub use memory::MemoryStore;
pub use traits::{
    ApplicationStore, ApplicationTxn, ApplicationWrite, AuditSink, BlobMetadata, BlobStore,
    IdentityStore, StoredBlob, UserWrite,
};

use std::sync::Arc;
use tracing::info;

/// Storage backends wired together for one process
#[derive(Clone)]
pub struct StorageLayer {
    /// Identity + application store
    pub store: Arc<MemoryStore>,
    /// Audit trail sink
    pub audit: Arc<MemoryAuditSink>,
    /// Blob store
    pub blobs: Arc<MemoryBlobStore>,
}

impl StorageLayer {
    /// Create an all-in-memory storage layer
    pub fn in_memory() -> Self {
        info!("initializing in-memory storage layer");
        Self {
            store: Arc::new(MemoryStore::new()),
            audit: Arc::new(MemoryAuditSink::new()),
            blobs: Arc::new(MemoryBlobStore::new()),
        }
    }
}
