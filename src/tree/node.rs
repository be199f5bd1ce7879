//! Tree Elements
//!
//! Leaves and internal nodes of the hash tree. Every internal node owns its
//! two children exclusively; subtrees are never shared between branches.

use std::fmt;

use crate::hashing::{empty_leaf_hash, node_hash, short_hex, NodeHash};

/// Leaf slot at a fixed position in the append order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRecord {
    pub index: usize,
    pub hash: NodeHash,
}

impl LeafRecord {
    pub fn new(index: usize, hash: NodeHash) -> Self {
        Self { index, hash }
    }

    /// Padding leaf awaiting content
    pub fn empty(index: usize) -> Self {
        Self::new(index, empty_leaf_hash())
    }
}

/// Internal node covering the inclusive leaf span `start..=end`
#[derive(Debug, Clone)]
pub struct InternalNode {
    pub left: Box<TreeElement>,
    pub right: Box<TreeElement>,
    pub hash: NodeHash,
    pub start: usize,
    pub end: usize,
}

impl InternalNode {
    pub fn new(left: TreeElement, right: TreeElement) -> Self {
        let hash = node_hash(left.hash(), right.hash());
        let start = left.start().min(right.start());
        let end = left.end().max(right.end());

        Self {
            left: Box::new(left),
            right: Box::new(right),
            hash,
            start,
            end,
        }
    }

    /// Recompute this node's hash from its children
    pub fn rehash(&mut self) {
        self.hash = node_hash(self.left.hash(), self.right.hash());
    }
}

#[derive(Debug, Clone)]
pub enum TreeElement {
    Leaf(LeafRecord),
    Internal(InternalNode),
}

impl TreeElement {
    pub fn start(&self) -> usize {
        match self {
            TreeElement::Leaf(leaf) => leaf.index,
            TreeElement::Internal(node) => node.start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            TreeElement::Leaf(leaf) => leaf.index,
            TreeElement::Internal(node) => node.end,
        }
    }

    pub fn hash(&self) -> &NodeHash {
        match self {
            TreeElement::Leaf(leaf) => &leaf.hash,
            TreeElement::Internal(node) => &node.hash,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start() <= index && index <= self.end()
    }

    pub fn spans(&self, start: usize, end: usize) -> bool {
        self.start() == start && self.end() == end
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeElement::Leaf(_))
    }
}

impl fmt::Display for TreeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeElement::Leaf(leaf) => write!(f, "{}", short_hex(&leaf.hash)),
            TreeElement::Internal(node) => write!(
                f,
                "({} {} {})",
                short_hex(&node.hash),
                node.left,
                node.right
            ),
        }
    }
}
