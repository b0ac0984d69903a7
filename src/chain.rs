//! Chain linearization: one deterministic order over a possibly-forking graph
//!
//! The admitted blocks of one log form a tree rooted at the absent-`previous`
//! sentinel. Linearization is a pre-order traversal of that tree, not a flat
//! timestamp sort: a block's entire subtree is emitted before its next
//! sibling, so a later-timestamped root-level block's descendants can precede
//! an earlier-timestamped grandchild of an older sibling. This order is the
//! single source of truth for every state fold and must be reproduced exactly
//! by all peers.

use crate::block::{Block, ContentId};
use std::collections::HashMap;

/// Order the arena parent-before-children, deterministically
///
/// Children are grouped under their `previous` value (the root sentinel
/// included) in admission order; each sibling set is stably sorted by
/// ascending timestamp, so ties keep admission order. Emission uses an
/// explicit stack rather than recursion to stay safe on deep chains.
pub(crate) fn linearize(arena: &[(ContentId, Block)]) -> Vec<(&ContentId, &Block)> {
    let mut children: HashMap<Option<&ContentId>, Vec<usize>> = HashMap::new();
    for (slot, (_, block)) in arena.iter().enumerate() {
        children
            .entry(block.previous.as_ref())
            .or_default()
            .push(slot);
    }
    for siblings in children.values_mut() {
        // Stable: admission order breaks timestamp ties
        siblings.sort_by_key(|&slot| arena[slot].1.timestamp);
    }

    let mut line = Vec::with_capacity(arena.len());
    let mut stack: Vec<usize> = Vec::new();
    if let Some(roots) = children.get(&None) {
        stack.extend(roots.iter().rev());
    }
    while let Some(slot) = stack.pop() {
        let (id, block) = &arena[slot];
        line.push((id, block));
        if let Some(kids) = children.get(&Some(id)) {
            stack.extend(kids.iter().rev());
        }
    }
    line
}
