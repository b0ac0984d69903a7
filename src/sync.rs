//! Replication: backfill a remote identity's log from one announced pointer
//!
//! Given the content identifier of a remote identity's latest block, the
//! replicator walks `previous` pointers backward through the external blob
//! store and feeds every unseen ancestor into that identity's [`LogStore`].
//! Each block is fetched at most once per call; blocks the store already
//! holds terminate the walk, so overlapping announcements converge without
//! refetching.

use crate::block::{Block, ContentId};
use crate::error::{LogError, Result};
use crate::log::LogStore;
use crate::signature::Verifier;
use crate::storage::BlobStore;
use std::collections::HashSet;

/// Outcome of one [`Replicator::sync`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Blocks fetched from the blob store during this call
    pub fetched: usize,
    /// Blocks admitted to the target store during this call
    pub admitted: usize,
}

/// Walks a remote log's ancestor chain through the external blob store
///
/// Fetches are sequential, one in flight at a time, following the single
/// linear ancestor chain. Separate `sync` calls for different identities are
/// independent and may run concurrently against their own target stores.
/// Timeouts, retry and backoff belong to the caller; this is the only
/// component that performs blocking I/O.
#[derive(Debug, Clone)]
pub struct Replicator<B> {
    blobs: B,
}

impl<B: BlobStore> Replicator<B> {
    /// Replicator reading from `blobs`
    pub fn new(blobs: B) -> Self {
        Self { blobs }
    }

    /// The blob store this replicator fetches from
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Backfill every unseen ancestor of `latest` into `store`
    ///
    /// The walk runs head→root with a per-call visited set, stopping at an
    /// already-visited identifier or one the store already holds; the
    /// collected blocks are then admitted parent-first so the ancestor check
    /// holds for every append. A fetch failure or rejected admission aborts
    /// the walk with that error; blocks admitted before the fault stay
    /// admitted, and a retry resumes without duplicate work.
    ///
    /// Re-invoking with the same `latest` after a full sync fetches nothing
    /// and performs zero admissions.
    pub async fn sync<V: Verifier>(
        &self,
        store: &mut LogStore<V>,
        latest: &ContentId,
    ) -> Result<SyncReport> {
        let mut visited: HashSet<ContentId> = HashSet::new();
        let mut pending: Vec<(ContentId, Block)> = Vec::new();
        let mut cursor = Some(latest.clone());

        while let Some(id) = cursor.take() {
            if store.contains(&id) || !visited.insert(id.clone()) {
                break;
            }
            let bytes = self
                .blobs
                .get(&id)
                .await?
                .ok_or_else(|| LogError::fetch_missing(id.clone()))?;
            let block = Block::from_cbor(&bytes)?;
            tracing::trace!(id = %id, previous = ?block.previous, "fetched block");
            cursor = block.previous.clone();
            pending.push((id, block));
        }

        let fetched = pending.len();
        let mut admitted = 0;
        for (id, block) in pending.into_iter().rev() {
            if let Err(err) = store.add_block(block, id.clone()) {
                tracing::warn!(id = %id, error = %err, "block rejected during sync");
                return Err(err);
            }
            admitted += 1;
        }

        tracing::debug!(
            owner = %store.owner(),
            fetched,
            admitted,
            "sync complete"
        );
        Ok(SyncReport { fetched, admitted })
    }
}
