//! In-memory blob store
//!
//! Holds uploaded bytes in a map and hands back opaque `memory://`
//! URLs. The engine never reads blob contents back; this exists so the
//! document-upload path can be exercised without external storage.

use super::traits::{BlobMetadata, BlobStore, StoredBlob};
use crate::utils::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory blob store
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether the store holds no blobs
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bytes: Vec<u8>, metadata: BlobMetadata) -> Result<StoredBlob> {
        let id = Uuid::new_v4().to_string();
        let size_bytes = bytes.len() as u64;
        self.blobs.write().insert(id.clone(), bytes);

        Ok(StoredBlob {
            url: format!("memory://blobs/{id}"),
            id,
            mime_type: metadata.mime_type,
            size_bytes,
        })
    }
}
