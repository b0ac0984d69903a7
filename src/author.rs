//! Writer-side convenience layer
//!
//! Optional API over the primitives for the common writing workflow: build a
//! block on the current head, sign it, persist its bytes to the blob store,
//! admit it to the author's own log, and announce the new head.

use crate::announce::{Announcement, Envelope, Transport, outbox_topic};
use crate::block::{Block, ContentId, Identity, Operation};
use crate::error::Result;
use crate::log::LogStore;
use crate::signature::{Keypair, RecoverVerifier, Verifier};
use crate::storage::BlobStore;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

/// One identity's writing side: its keypair, its own log, and the blob store
/// the blocks are persisted through
pub struct Author<B, V = RecoverVerifier> {
    keypair: Keypair,
    store: LogStore<V>,
    blobs: B,
    head: Option<ContentId>,
}

impl<B: BlobStore> Author<B> {
    /// Author with the default recoverable-signature verifier
    pub fn new(keypair: Keypair, blobs: B) -> Self {
        let store = LogStore::new(keypair.identity());
        Self {
            keypair,
            store,
            blobs,
            head: None,
        }
    }
}

impl<B: BlobStore, V: Verifier> Author<B, V> {
    /// Author with a custom verifier capability
    pub fn with_verifier(keypair: Keypair, blobs: B, verifier: V) -> Self {
        let store = LogStore::with_verifier(keypair.identity(), verifier);
        Self {
            keypair,
            store,
            blobs,
            head: None,
        }
    }

    /// The identity this author writes as
    pub fn identity(&self) -> Identity {
        self.keypair.identity()
    }

    /// The author's own log store
    pub fn store(&self) -> &LogStore<V> {
        &self.store
    }

    /// Content identifier of the latest appended block, if any
    pub fn head(&self) -> Option<&ContentId> {
        self.head.as_ref()
    }

    /// Sign `operation` into a block on the current head, persist it, admit
    /// it, and advance the head
    pub async fn append(&mut self, operation: Operation) -> Result<ContentId> {
        self.append_at(operation, now_millis()).await
    }

    /// [`append`](Author::append) with an explicit timestamp
    pub async fn append_at(&mut self, operation: Operation, timestamp: i64) -> Result<ContentId> {
        let block = Block::new(
            self.head.clone(),
            timestamp,
            self.keypair.identity(),
            operation,
        )
        .sign(&self.keypair)?;

        let id = self.blobs.put(&block.to_cbor()?).await?;
        self.store.add_block(block, id.clone())?;
        self.head = Some(id.clone());
        Ok(id)
    }

    /// Announcement for the current head
    ///
    /// Errors with [`LogError::EmptyLog`](crate::error::LogError::EmptyLog)
    /// before the first append.
    pub fn announcement(&self) -> Result<Announcement> {
        let (id, block) = self.store.head()?;
        Ok(Announcement::update(id.clone(), block.timestamp))
    }

    /// Publish a signed envelope for the current head on this identity's
    /// outbox topic
    pub async fn announce<T: Transport>(&self, transport: &T) -> Result<()> {
        let envelope = Envelope::signed(&self.announcement()?, &self.keypair)?;
        transport
            .publish(&outbox_topic(&self.identity()), envelope.to_bytes()?)
            .await
    }
}
