//! Error types for log operations

use std::error::Error;

/// Boxed error type for error sources
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Result type alias for log operations
pub type Result<T> = std::result::Result<T, LogError>;

use crate::block::{ContentId, Identity};

/// Errors surfaced by block admission, replication, and the wire codecs
///
/// The admission variants (`AuthorMismatch`, `MissingAncestor`,
/// `InvalidSignature`) are reported synchronously by
/// [`LogStore::add_block`](crate::log::LogStore::add_block), in that check
/// order. `Fetch` is the retryable replication fault; `EmptyLog` is the valid
/// "no blocks yet" steady state, surfaced only where a concrete head block is
/// demanded.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LogError {
    /// Block claims an operator other than the store owner
    #[error("author mismatch: block claims {claimed}, log is owned by {owner}")]
    #[diagnostic(
        code(weft::author_mismatch),
        help("each log store admits blocks from exactly one operator; route the block to that identity's store")
    )]
    AuthorMismatch {
        /// Operator named by the rejected block
        claimed: Identity,
        /// Identity the store is scoped to
        owner: Identity,
    },

    /// Block references a parent not yet admitted
    #[error("missing ancestor: {0}")]
    #[diagnostic(
        code(weft::missing_ancestor),
        help("replicate the parent block first, then retry the append")
    )]
    MissingAncestor(ContentId),

    /// Signature does not authenticate the block's canonical form
    #[error("invalid signature on block by {operator}")]
    #[diagnostic(code(weft::invalid_signature))]
    InvalidSignature {
        /// Operator whose key failed to authenticate the block
        operator: Identity,
    },

    /// Blob store failed to produce a block's bytes
    #[error("blob fetch failed for {id}")]
    #[diagnostic(
        code(weft::fetch),
        help("blob-store faults are retryable; re-sync from the same head")
    )]
    Fetch {
        /// Identifier that could not be fetched
        id: ContentId,
        /// Underlying store fault, absent when the block is simply unknown
        #[source]
        source: Option<BoxError>,
    },

    /// No blocks admitted yet for this identity
    #[error("log for {0} has no blocks yet")]
    #[diagnostic(
        code(weft::empty_log),
        help("a freshly-followed identity legitimately starts empty; treat default state as current")
    )]
    EmptyLog(Identity),

    /// Encoding or decoding a wire form failed
    #[error("serialization failed")]
    #[diagnostic(code(weft::serialization))]
    Serialization(#[source] BoxError),

    /// Key material could not be parsed
    #[error("invalid key material: {0}")]
    #[diagnostic(code(weft::invalid_key))]
    InvalidKey(String),

    /// Cryptographic operation failed
    #[error("cryptographic operation failed")]
    #[diagnostic(code(weft::crypto))]
    Crypto(#[source] BoxError),
}

impl LogError {
    /// Create a serialization error
    pub fn serialization(source: impl Error + Send + Sync + 'static) -> Self {
        Self::Serialization(Box::new(source))
    }

    /// Create a crypto error
    pub fn crypto(source: impl Error + Send + Sync + 'static) -> Self {
        Self::Crypto(Box::new(source))
    }

    /// Fetch error for a blob-store fault
    pub fn fetch(id: ContentId, source: impl Error + Send + Sync + 'static) -> Self {
        Self::Fetch {
            id,
            source: Some(Box::new(source)),
        }
    }

    /// Fetch error for a block the blob store does not know
    pub fn fetch_missing(id: ContentId) -> Self {
        Self::Fetch { id, source: None }
    }
}
