//! Blob storage abstraction — the external content-addressable store
//!
//! The log engine never persists bytes itself: block serializations live in a
//! [`BlobStore`], which mints the [`ContentId`]s the log is keyed by. The core
//! treats `get` failures as a replication fault, not a log-integrity fault.

use crate::block::ContentId;
use crate::error::{LogError, Result};
use bytes::Bytes;
use sha2::{Digest, Sha256};

/// Async content-addressable blob storage
///
/// Identifiers are opaque and stable for identical bytes. Implementations
/// might use an in-memory map ([`MemoryBlobStore`]), a networked store, or a
/// local database; `Clone` is required so the replicator and writers can share
/// a handle.
#[trait_variant::make(Send)]
pub trait BlobStore: Clone {
    /// Fetch a blob's bytes; `None` when the identifier is unknown
    async fn get(&self, id: &ContentId) -> Result<Option<Bytes>>;

    /// Persist bytes and return their content identifier
    ///
    /// Identical bytes must yield the identical identifier.
    async fn put(&self, data: &[u8]) -> Result<ContentId>;

    /// Existence check without fetching the bytes
    async fn has(&self, id: &ContentId) -> Result<bool>;
}

pub mod memory;

pub use memory::MemoryBlobStore;

/// SHA-256 multihash code
const SHA2_256: u64 = 0x12;
/// DAG-CBOR codec identifier for CIDs
const DAG_CBOR: u64 = 0x71;

/// Compute the content identifier for a byte serialization
///
/// CIDv1 with SHA-256 multihash and DAG-CBOR codec, rendered in string form.
/// Identical bytes produce the identical identifier, which is the contract the
/// log's causal pointers rely on.
pub fn content_id_for(data: &[u8]) -> Result<ContentId> {
    let digest = Sha256::digest(data);
    let mh = multihash::Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(LogError::serialization)?;
    Ok(ContentId::new(cid::Cid::new_v1(DAG_CBOR, mh).to_string()))
}
