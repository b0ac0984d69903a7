//! In-memory blob storage implementation

use crate::block::ContentId;
use crate::error::Result;
use crate::storage::{BlobStore, content_id_for};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// In-memory blob storage using a `BTreeMap`
///
/// Useful for tests, demos, and single-process setups. Uses `Bytes` for
/// reference-counted storage with cheap cloning; cloning the store itself
/// shares the underlying map, so one instance can serve a writer and several
/// replicators.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<BTreeMap<ContentId, Bytes>>>,
}

impl MemoryBlobStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs stored
    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    /// Whether the store holds no blobs
    pub fn is_empty(&self) -> bool {
        self.blobs.read().unwrap().is_empty()
    }

    /// Drop all blobs
    pub fn clear(&self) {
        self.blobs.write().unwrap().clear();
    }

    /// Remove a single blob, simulating a missing ancestor in tests
    pub fn remove(&self, id: &ContentId) -> Option<Bytes> {
        self.blobs.write().unwrap().remove(id)
    }
}

impl BlobStore for MemoryBlobStore {
    async fn get(&self, id: &ContentId) -> Result<Option<Bytes>> {
        Ok(self.blobs.read().unwrap().get(id).cloned())
    }

    async fn put(&self, data: &[u8]) -> Result<ContentId> {
        let id = content_id_for(data)?;
        self.blobs
            .write()
            .unwrap()
            .insert(id.clone(), Bytes::copy_from_slice(data));
        Ok(id)
    }

    async fn has(&self, id: &ContentId) -> Result<bool> {
        Ok(self.blobs.read().unwrap().contains_key(id))
    }
}
