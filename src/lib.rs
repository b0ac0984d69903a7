//! Per-identity, append-only, cryptographically authenticated operation logs
//!
//! Each identity owns exactly one log of signed blocks; peers replicate it by
//! fetching block bytes from a content-addressable blob store and verifying
//! them locally — no central authority validates or orders writes. This crate
//! provides the engine:
//!
//! - **Block model**: immutable signed blocks with a causal `previous`
//!   pointer and a typed operation payload
//! - **Signature verification**: a pluggable [`Verifier`] capability; the
//!   default recovers the signer's identity from a recoverable signature
//! - **Log store**: per-identity admission with authorship, referential, and
//!   authenticity checks
//! - **Chain linearization**: one deterministic order over a possibly-forking
//!   block graph
//! - **State projection**: pure folds of the line into [`ProfileState`] and
//!   [`TimelineState`]
//! - **Replication**: backfill a remote log from a single announced pointer
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_log::{Author, Keypair, LogStore, MemoryBlobStore, Operation, Replicator};
//!
//! # async fn example() -> weft_log::Result<()> {
//! let blobs = MemoryBlobStore::new();
//!
//! // Writer side: append signed operations and obtain the head pointer
//! let mut author = Author::new(Keypair::generate(), blobs.clone());
//! author.append(Operation::SetUsername { username: "alice".into() }).await?;
//! let head = author.append(Operation::SetBio { bio: "hello".into() }).await?;
//!
//! // Follower side: backfill the announced head into a local store
//! let mut replica = LogStore::new(author.identity());
//! Replicator::new(blobs).sync(&mut replica, &head).await?;
//! assert_eq!(replica.profile_state().username, "alice");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

/// Announcements and the pub/sub transport boundary
pub mod announce;
/// Writer-side convenience layer
pub mod author;
/// The block model
pub mod block;
mod chain;
pub mod error;
/// Per-identity log store and admission
pub mod log;
/// Signature verification capability
pub mod signature;
/// Projected application states
pub mod state;
/// Blob storage abstraction
pub mod storage;
/// Replication
pub mod sync;

pub use announce::{Announcement, Envelope, MemoryTransport, Subscription, Transport, outbox_topic};
pub use author::Author;
pub use block::{Block, BlockKind, ContentId, Identity, Operation};
pub use error::{LogError, Result};
pub use log::LogStore;
pub use signature::{Keypair, RecoverVerifier, Verifier};
pub use state::{ProfileState, TimelineState};
pub use storage::{BlobStore, MemoryBlobStore};
pub use sync::{Replicator, SyncReport};
