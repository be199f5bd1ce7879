//! Merkle Tree
//!
//! Append-only hash tree over a power-of-two number of leaf slots. Slots past
//! the logical size hold the padding hash until content is appended there.

pub mod node;
pub mod proof;

use std::fmt;

use tracing::{debug, info};

use crate::error::LogError;
use crate::hashing::{empty_leaf_hash, leaf_hash, NodeHash};

pub use node::{InternalNode, LeafRecord, TreeElement};
pub use proof::{root_from_path, verify_consistency, verify_inclusion, ConsistencyCheck};

/// Number of leaf slots needed for `size` entries
pub fn capacity_for(size: usize) -> usize {
    size.max(1).next_power_of_two()
}

#[derive(Debug, Clone)]
pub struct MerkleTree {
    root: TreeElement,
    leaves: Vec<NodeHash>,
    size: usize,
}

impl MerkleTree {
    /// Build a tree over the given entries, padded to the next power of two
    pub fn new<I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut leaves: Vec<NodeHash> = entries
            .into_iter()
            .map(|entry| leaf_hash(entry.as_ref()))
            .collect();
        let size = leaves.len();
        leaves.resize(capacity_for(size), empty_leaf_hash());

        info!(
            "Building Merkle tree from {} entries ({} slots)",
            size,
            leaves.len()
        );

        let root = build(&leaves);
        Self { root, leaves, size }
    }

    /// Seed a tree with one entry per line of `log`.
    ///
    /// Lines are split with [`str::lines`], so an empty blob is an empty log
    /// and a trailing `\r` is stripped from each line.
    pub fn from_text(log: &str) -> Self {
        Self::new(log.lines())
    }

    pub fn root(&self) -> &TreeElement {
        &self.root
    }

    pub fn root_hash(&self) -> NodeHash {
        *self.root.hash()
    }

    /// Number of appended entries
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of leaf slots, always a power of two
    pub fn capacity(&self) -> usize {
        self.leaves.len()
    }

    pub fn height(&self) -> u32 {
        self.capacity().trailing_zeros()
    }

    pub fn leaf_hashes(&self) -> &[NodeHash] {
        &self.leaves
    }

    /// Append an entry and return the index it was assigned.
    ///
    /// Fills the next padding slot and rehashes its ancestors. When every
    /// slot is taken the leaf list doubles and the tree is rebuilt first.
    pub fn append(&mut self, content: &[u8]) -> usize {
        self.size += 1;

        if self.size > self.leaves.len() {
            let capacity = capacity_for(self.size);
            info!(
                "Growing Merkle tree from {} to {} slots",
                self.leaves.len(),
                capacity
            );
            self.leaves.resize(capacity, empty_leaf_hash());
            self.root = build(&self.leaves);
        }

        let index = self.size - 1;
        let hash = leaf_hash(content);
        self.leaves[index] = hash;
        update_leaf(&mut self.root, index, hash);

        debug!("Appended entry {} to Merkle tree", index);
        index
    }

    /// Sibling hashes from the leaf at `index` up to the root, leaf side first
    pub fn get_path(&self, index: usize) -> Result<Vec<NodeHash>, LogError> {
        if index > self.root.end() {
            return Err(LogError::index_out_of_range(index, self.root.end()));
        }

        let mut path = Vec::with_capacity(self.height() as usize);
        let mut current = &self.root;

        while let TreeElement::Internal(node) = current {
            if node.right.contains(index) {
                path.push(*node.left.hash());
                current = &node.right;
            } else {
                path.push(*node.right.hash());
                current = &node.left;
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Consistency proof between a tree of `prior_size` entries and this one.
    ///
    /// Walks from the root toward the subtree spanning exactly
    /// `prior_size..=capacity - 1`, collecting the hash of each branch not
    /// taken, and ends with that subtree's hash when it exists. Leaves are
    /// never matched: the walk stops on reaching one without adding it.
    pub fn get_proof(&self, prior_size: usize) -> Result<Vec<NodeHash>, LogError> {
        if prior_size > self.leaves.len() {
            return Err(LogError::size_out_of_range(
                prior_size as i64,
                self.leaves.len(),
            ));
        }

        let start = prior_size;
        let end = self.leaves.len() - 1;
        let mut proof = Vec::new();
        let mut current = &self.root;

        while let TreeElement::Internal(node) = current {
            if node.start == start && node.end == end {
                proof.push(node.hash);
                break;
            }

            if start >= node.right.start() && end <= node.end {
                proof.push(*node.left.hash());
                current = &node.right;
            } else {
                proof.push(*node.right.hash());
                current = &node.left;
            }
        }

        Ok(proof)
    }
}

impl fmt::Display for MerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Build a tree bottom-up by pairing adjacent elements level by level.
///
/// `leaves` always has a power-of-two length, so each level halves evenly
/// and the shape matches splitting every span into equal halves.
fn build(leaves: &[NodeHash]) -> TreeElement {
    debug_assert!(leaves.len().is_power_of_two());

    let mut level: Vec<TreeElement> = leaves
        .iter()
        .enumerate()
        .map(|(index, hash)| TreeElement::Leaf(LeafRecord::new(index, *hash)))
        .collect();

    while level.len() > 1 {
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
        let mut nodes = level.into_iter();

        while let Some(left) = nodes.next() {
            match nodes.next() {
                Some(right) => next_level.push(TreeElement::Internal(InternalNode::new(left, right))),
                None => next_level.push(left),
            }
        }

        level = next_level;
    }

    match level.pop() {
        Some(root) => root,
        None => TreeElement::Leaf(LeafRecord::empty(0)),
    }
}

/// Set the leaf at `index` and rehash every ancestor on the way back up.
///
/// Recursion depth is the tree height, `log2(capacity)`.
fn update_leaf(element: &mut TreeElement, index: usize, hash: NodeHash) {
    match element {
        TreeElement::Leaf(leaf) => {
            debug_assert_eq!(leaf.index, index);
            leaf.hash = hash;
        }
        TreeElement::Internal(node) => {
            if node.right.contains(index) {
                update_leaf(&mut node.right, index, hash);
            } else {
                update_leaf(&mut node.left, index, hash);
            }
            node.rehash();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::node_hash;

    fn entries(names: &[&str]) -> Vec<Vec<u8>> {
        names.iter().map(|n| n.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_capacity_for() {
        assert_eq!(capacity_for(0), 1);
        assert_eq!(capacity_for(1), 1);
        assert_eq!(capacity_for(2), 2);
        assert_eq!(capacity_for(3), 4);
        assert_eq!(capacity_for(5), 8);
        assert_eq!(capacity_for(8), 8);
        assert_eq!(capacity_for(9), 16);
    }

    #[test]
    fn test_three_entry_tree() {
        let tree = MerkleTree::new(entries(&["a", "b", "c"]));

        assert_eq!(tree.size(), 3);
        assert_eq!(tree.capacity(), 4);
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.leaf_hashes()[3], empty_leaf_hash());

        let ab = node_hash(&leaf_hash(b"a"), &leaf_hash(b"b"));
        let c_pad = node_hash(&leaf_hash(b"c"), &empty_leaf_hash());
        assert_eq!(tree.root_hash(), node_hash(&ab, &c_pad));
        assert!(tree.root().spans(0, 3));

        let path = tree.get_path(1).unwrap();
        assert_eq!(path, vec![leaf_hash(b"a"), c_pad]);
        assert!(verify_inclusion(&path, &leaf_hash(b"b"), 1, &tree.root_hash()));
    }

    #[test]
    fn test_padding_invariant() {
        for n in 0..=17usize {
            let items: Vec<String> = (0..n).map(|i| format!("entry-{}", i)).collect();
            let tree = MerkleTree::new(&items);

            assert_eq!(tree.capacity(), capacity_for(n), "capacity for {} entries", n);
            assert!(tree.capacity() >= n);
            assert!(tree.root().spans(0, tree.capacity() - 1));
            for slot in &tree.leaf_hashes()[n..] {
                assert_eq!(*slot, empty_leaf_hash());
            }
        }
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::new(Vec::<Vec<u8>>::new());

        assert_eq!(tree.size(), 0);
        assert_eq!(tree.capacity(), 1);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root_hash(), empty_leaf_hash());
        assert!(tree.get_path(0).unwrap().is_empty());
    }

    #[test]
    fn test_from_text() {
        let tree = MerkleTree::from_text("a\nb\nc\n");
        let expected = MerkleTree::new(entries(&["a", "b", "c"]));
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.root_hash(), expected.root_hash());

        assert_eq!(MerkleTree::from_text("").size(), 0);
        assert_eq!(
            MerkleTree::from_text("a\r\nb").root_hash(),
            MerkleTree::new(entries(&["a", "b"])).root_hash()
        );
    }

    #[test]
    fn test_round_trip_inclusion() {
        for n in 2..=20usize {
            let items: Vec<String> = (0..n).map(|i| format!("log line {}", i)).collect();
            let tree = MerkleTree::new(&items);
            let root = tree.root_hash();

            for (i, item) in items.iter().enumerate() {
                let path = tree.get_path(i).unwrap();
                assert_eq!(path.len(), tree.height() as usize);
                assert!(
                    verify_inclusion(&path, &leaf_hash(item.as_bytes()), i, &root),
                    "entry {} of {}",
                    i,
                    n
                );
            }
        }
    }

    #[test]
    fn test_path_rejects_wrong_index() {
        let tree = MerkleTree::new(entries(&["a", "b", "c", "d"]));
        let path = tree.get_path(1).unwrap();

        assert!(!verify_inclusion(&path, &leaf_hash(b"b"), 0, &tree.root_hash()));
        assert!(!verify_inclusion(&path, &leaf_hash(b"a"), 1, &tree.root_hash()));
    }

    #[test]
    fn test_get_path_out_of_range() {
        let tree = MerkleTree::new(entries(&["a", "b", "c"]));

        // Padding slots are addressable, anything past them is not
        assert!(tree.get_path(3).is_ok());
        let err = tree.get_path(10).unwrap_err();
        assert!(err.is_out_of_range());
        assert!(err.to_string().contains("index out of range"));
    }

    #[test]
    fn test_append_fills_placeholder() {
        let mut tree = MerkleTree::new(entries(&["a", "b", "c"]));
        let before = tree.root_hash();

        let index = tree.append(b"d");

        assert_eq!(index, 3);
        assert_eq!(tree.size(), 4);
        assert_eq!(tree.capacity(), 4);
        assert_ne!(tree.root_hash(), before);
        assert_eq!(tree.root_hash(), MerkleTree::new(entries(&["a", "b", "c", "d"])).root_hash());

        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            let path = tree.get_path(i).unwrap();
            assert!(verify_inclusion(&path, &leaf_hash(name.as_bytes()), i, &tree.root_hash()));
        }
    }

    #[test]
    fn test_append_leaves_other_slots_untouched() {
        let mut tree = MerkleTree::new(entries(&["a", "b", "c", "d", "e"]));
        let before = tree.leaf_hashes().to_vec();

        tree.append(b"f");

        for (i, (old, new)) in before.iter().zip(tree.leaf_hashes()).enumerate() {
            if i == 5 {
                assert_eq!(*new, leaf_hash(b"f"));
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn test_append_grows_capacity() {
        let mut tree = MerkleTree::new(entries(&["a", "b", "c", "d"]));

        tree.append(b"e");

        assert_eq!(tree.size(), 5);
        assert_eq!(tree.capacity(), 8);
        assert!(tree.root().spans(0, 7));
        assert_eq!(
            tree.root_hash(),
            MerkleTree::new(entries(&["a", "b", "c", "d", "e"])).root_hash()
        );
    }

    #[test]
    fn test_incremental_matches_rebuild() {
        let items: Vec<String> = (0..40).map(|i| format!("record-{}", i)).collect();
        let mut tree = MerkleTree::new(Vec::<Vec<u8>>::new());

        for (i, item) in items.iter().enumerate() {
            tree.append(item.as_bytes());
            let rebuilt = MerkleTree::new(&items[..=i]);
            assert_eq!(tree.root_hash(), rebuilt.root_hash(), "after {} appends", i + 1);
            assert_eq!(tree.capacity(), rebuilt.capacity());
        }
    }

    #[test]
    fn test_append_to_empty_tree() {
        let mut tree = MerkleTree::new(Vec::<Vec<u8>>::new());
        let before = tree.root_hash();

        assert_eq!(tree.append(b"first"), 0);
        assert_eq!(tree.capacity(), 1);
        assert_eq!(tree.root_hash(), leaf_hash(b"first"));
        assert_ne!(tree.root_hash(), before);
    }

    #[test]
    fn test_get_proof_exact_subtree() {
        let tree = MerkleTree::new(entries(&["a", "b", "c", "d", "e", "f"]));
        let leaves = tree.leaf_hashes();
        let left_half = node_hash(
            &node_hash(&leaves[0], &leaves[1]),
            &node_hash(&leaves[2], &leaves[3]),
        );
        let right_half = node_hash(
            &node_hash(&leaves[4], &leaves[5]),
            &node_hash(&leaves[6], &leaves[7]),
        );

        assert_eq!(tree.get_proof(4).unwrap(), vec![left_half, right_half]);
        assert_eq!(tree.get_proof(0).unwrap(), vec![tree.root_hash()]);
    }

    #[test]
    fn test_get_proof_stops_at_leaf() {
        let tree = MerkleTree::new(entries(&["a", "b", "c", "d"]));
        let leaves = tree.leaf_hashes();

        // The span 3..=3 is a single leaf, which is never part of the proof
        let proof = tree.get_proof(3).unwrap();
        assert_eq!(proof, vec![node_hash(&leaves[0], &leaves[1]), leaves[2]]);

        let tree = MerkleTree::new(entries(&["a", "b", "c", "d", "e", "f", "g", "h"]));
        assert_eq!(tree.get_proof(7).unwrap().len(), 3);
    }

    #[test]
    fn test_get_proof_on_single_slot() {
        let empty = MerkleTree::new(Vec::<Vec<u8>>::new());
        assert!(empty.get_proof(0).unwrap().is_empty());

        let single = MerkleTree::new(entries(&["a"]));
        assert!(single.get_proof(0).unwrap().is_empty());
        assert!(single.get_proof(1).unwrap().is_empty());
    }

    #[test]
    fn test_get_proof_out_of_range() {
        let tree = MerkleTree::new(entries(&["a", "b", "c"]));

        assert!(tree.get_proof(4).is_ok());
        let err = tree.get_proof(5).unwrap_err();
        assert!(err.to_string().contains("size out of range"));
    }

    #[test]
    fn test_display() {
        let tree = MerkleTree::new(entries(&["a", "b"]));
        let rendered = tree.to_string();

        assert!(rendered.starts_with('('));
        assert!(rendered.ends_with(')'));
        assert_eq!(rendered.split_whitespace().count(), 3);
    }
}
