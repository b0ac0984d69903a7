//! Per-identity log store: the block arena and the admission protocol
//!
//! One [`LogStore`] holds every block known for exactly one identity, keyed
//! by content identifier. It is a single-writer, single-owner resource with
//! no internal locking; callers serialize mutation (e.g. one task per
//! followed identity). Reads — the line and both projections — are pure over
//! the admitted block set.

use crate::block::{Block, ContentId, Identity};
use crate::chain;
use crate::error::{LogError, Result};
use crate::signature::{RecoverVerifier, Verifier};
use crate::state::{self, ProfileState, TimelineState};
use std::collections::HashMap;

/// All blocks known for one identity, keyed by content identifier
///
/// Blocks live in an arena with index-based cross-references; the `previous`
/// pointer is resolved through the id index, never through in-memory links.
/// The verifier capability is injected at construction.
pub struct LogStore<V = RecoverVerifier> {
    owner: Identity,
    verifier: V,
    arena: Vec<(ContentId, Block)>,
    index: HashMap<ContentId, usize>,
}

impl LogStore<RecoverVerifier> {
    /// Store for `owner` with the default recoverable-signature verifier
    pub fn new(owner: Identity) -> Self {
        Self::with_verifier(owner, RecoverVerifier)
    }
}

impl<V: Verifier> LogStore<V> {
    /// Store for `owner` with a custom verifier capability
    pub fn with_verifier(owner: Identity, verifier: V) -> Self {
        Self {
            owner,
            verifier,
            arena: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The identity this store is scoped to
    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Number of admitted blocks
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether no blocks have been admitted yet
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Whether `id` has been admitted
    pub fn contains(&self, id: &ContentId) -> bool {
        self.index.contains_key(id)
    }

    /// Fetch an admitted block by identifier
    pub fn get(&self, id: &ContentId) -> Option<&Block> {
        self.index.get(id).map(|&slot| &self.arena[slot].1)
    }

    /// Admit a block under a caller-supplied content identifier
    ///
    /// Checks run in a fixed order for deterministic error reporting:
    ///
    /// 1. the block's operator must equal this store's owner
    ///    ([`LogError::AuthorMismatch`]);
    /// 2. `previous`, when present, must already be admitted — no forward or
    ///    dangling references, ever ([`LogError::MissingAncestor`]);
    /// 3. the verifier must accept the canonical form under the block's
    ///    signature and operator ([`LogError::InvalidSignature`]).
    ///
    /// The arena mutates only on full success; there are no partial writes.
    /// Re-adding an already-present identifier overwrites silently in place,
    /// since replication may redeliver, and keeps the original admission
    /// position.
    ///
    /// The store never computes or validates content addressing itself; the
    /// identifier is minted by the blob store from the block's bytes.
    pub fn add_block(&mut self, block: Block, id: ContentId) -> Result<()> {
        if block.operator != self.owner {
            return Err(LogError::AuthorMismatch {
                claimed: block.operator.clone(),
                owner: self.owner.clone(),
            });
        }

        if let Some(previous) = &block.previous {
            if !self.index.contains_key(previous) {
                return Err(LogError::MissingAncestor(previous.clone()));
            }
        }

        let canonical = block.canonical_bytes()?;
        if !self.verifier.verify(&canonical, &block.sig, &block.operator) {
            return Err(LogError::InvalidSignature {
                operator: block.operator.clone(),
            });
        }

        match self.index.get(&id) {
            Some(&slot) => self.arena[slot].1 = block,
            None => {
                self.index.insert(id.clone(), self.arena.len());
                self.arena.push((id, block));
            }
        }
        Ok(())
    }

    /// The line: deterministic chronological order over every admitted block
    ///
    /// Pre-order over the block tree: siblings by ascending timestamp
    /// (admission order breaks ties), each subtree emitted fully before the
    /// next sibling. Pure and side-effect-free; recomputed on demand.
    pub fn line(&self) -> Vec<(&ContentId, &Block)> {
        chain::linearize(&self.arena)
    }

    /// The final element of the line
    ///
    /// Head means last in the deterministic order, not newest by clock: on a
    /// forked log it is the deepest block of the latest root-level subtree,
    /// which an earlier subtree's descendant may out-timestamp.
    ///
    /// Errors with [`LogError::EmptyLog`] when nothing has been admitted yet;
    /// callers that only need current state should use the projections, which
    /// treat an empty log as default state.
    pub fn head(&self) -> Result<(&ContentId, &Block)> {
        self.line()
            .into_iter()
            .next_back()
            .ok_or_else(|| LogError::EmptyLog(self.owner.clone()))
    }

    /// Fold the line into the current profile state
    pub fn profile_state(&self) -> ProfileState {
        state::project_profile(self.line())
    }

    /// Fold the line into the current timeline state
    pub fn timeline_state(&self) -> TimelineState {
        state::project_timeline(self.line())
    }
}
