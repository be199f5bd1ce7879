//! Proof Verification
//!
//! Recomputes roots from the proofs handed out by [`MerkleTree`](super::MerkleTree).
//! Inclusion paths are replayed with index parity, which agrees with the
//! span-based descent that produced them only because the tree is always a
//! complete power-of-two tree.

use crate::hashing::{empty_leaf_hash, empty_subtree_hash, node_hash, NodeHash};

use super::capacity_for;

/// Fold an inclusion path into the root it commits to.
///
/// An even index means the running hash is a left child. Returns `None` for
/// an empty path, which never proves anything.
pub fn root_from_path(path: &[NodeHash], leaf: &NodeHash, index: usize) -> Option<NodeHash> {
    if path.is_empty() {
        return None;
    }

    let mut index = index;
    let mut current = *leaf;

    for sibling in path {
        current = if index % 2 == 0 {
            node_hash(&current, sibling)
        } else {
            node_hash(sibling, &current)
        };
        index /= 2;
    }

    Some(current)
}

/// Check that `path` links `leaf` at `index` to `root`
pub fn verify_inclusion(path: &[NodeHash], leaf: &NodeHash, index: usize, root: &NodeHash) -> bool {
    root_from_path(path, leaf, index).as_ref() == Some(root)
}

/// Outcome of checking a consistency proof
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyCheck {
    /// The earlier tree is an unmodified prefix of the current one
    Consistent,
    /// The proof contradicts one of the two roots
    Inconsistent,
    /// No internal node spans exactly `prior_size..capacity`, so the proof carries no anchor
    Unprovable,
}

impl ConsistencyCheck {
    pub fn is_consistent(&self) -> bool {
        matches!(self, ConsistencyCheck::Consistent)
    }
}

/// Depth of the subtree spanning `prior_size..=capacity - 1`, if one exists.
///
/// Replays the descent of `get_proof` on spans alone. Any step to the left
/// leaves the right edge behind, so only the right spine can hold the anchor.
/// A leaf never anchors a proof.
fn anchor_depth(prior_size: usize, capacity: usize) -> Option<usize> {
    let end = capacity - 1;
    let mut start = 0;
    let mut depth = 0;

    loop {
        if start == end {
            return None;
        }
        if start == prior_size {
            return Some(depth);
        }

        let mid = start + (end - start + 1) / 2;
        if prior_size < mid {
            return None;
        }
        start = mid;
        depth += 1;
    }
}

/// Verify that a tree of `prior_size` entries with root `prior_root` is a
/// prefix of the tree of `size` entries with root `root`.
pub fn verify_consistency(
    prior_size: usize,
    prior_root: &NodeHash,
    size: usize,
    root: &NodeHash,
    proof: &[NodeHash],
) -> ConsistencyCheck {
    if prior_size > size {
        return ConsistencyCheck::Inconsistent;
    }
    if prior_size == size {
        return if prior_root == root {
            ConsistencyCheck::Consistent
        } else {
            ConsistencyCheck::Inconsistent
        };
    }

    let capacity = capacity_for(size);
    let Some(depth) = anchor_depth(prior_size, capacity) else {
        return ConsistencyCheck::Unprovable;
    };
    if proof.len() != depth + 1 {
        return ConsistencyCheck::Inconsistent;
    }

    let (siblings, anchor) = proof.split_at(depth);
    let fold = |base: NodeHash| {
        siblings
            .iter()
            .rev()
            .fold(base, |acc, sibling| node_hash(sibling, &acc))
    };

    if fold(anchor[0]) != *root {
        return ConsistencyCheck::Inconsistent;
    }

    let expected_prior = if prior_size == 0 {
        empty_leaf_hash()
    } else if capacity_for(prior_size) < capacity {
        // The earlier tree was full and is now the left half
        match siblings.first() {
            Some(left_half) => *left_half,
            None => return ConsistencyCheck::Unprovable,
        }
    } else {
        fold(empty_subtree_hash((capacity - prior_size).trailing_zeros()))
    };

    if expected_prior == *prior_root {
        ConsistencyCheck::Consistent
    } else {
        ConsistencyCheck::Inconsistent
    }
}
