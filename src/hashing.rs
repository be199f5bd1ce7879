//! Hash Primitives
//!
//! Domain-separated SHA-256 hashing shared by the tree, the service and the
//! auditor. Leaves are hashed as `H(0x00 || content)` and internal nodes as
//! `H(0x01 || left || right)` so a leaf can never be passed off as a node.

use sha2::{Digest, Sha256};

use crate::error::LogError;

/// Width of every digest in the log
pub const HASH_LEN: usize = 32;

/// Prefix byte for leaf hashes
pub const LEAF_PREFIX: u8 = 0x00;

/// Prefix byte for internal node hashes
pub const NODE_PREFIX: u8 = 0x01;

/// Number of bytes shown by [`short_hex`]
pub const SHORT_HEX_LEN: usize = 5;

pub type NodeHash = [u8; HASH_LEN];

/// Hash log content as a leaf
pub fn leaf_hash(content: &[u8]) -> NodeHash {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(content);
    hasher.finalize().into()
}

/// Hash two children into their parent
pub fn node_hash(left: &NodeHash, right: &NodeHash) -> NodeHash {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Hash held by padding leaves: the leaf hash of a single zero byte
pub fn empty_leaf_hash() -> NodeHash {
    leaf_hash(&[0x00])
}

/// Root of a complete subtree of `2^height` padding leaves
pub fn empty_subtree_hash(height: u32) -> NodeHash {
    let mut hash = empty_leaf_hash();
    for _ in 0..height {
        hash = node_hash(&hash, &hash);
    }
    hash
}

pub fn encode_hash(hash: &NodeHash) -> String {
    hex::encode(hash)
}

/// Decode a hex digest received from a peer.
///
/// A digest of the wrong width means the peer hashes with a different
/// function, which is reported as a hash-function error.
pub fn decode_hash(encoded: &str) -> Result<NodeHash, LogError> {
    let bytes = hex::decode(encoded)
        .map_err(|e| LogError::TransportError(format!("Malformed digest {:?}: {}", encoded, e)))?;

    NodeHash::try_from(bytes.as_slice()).map_err(|_| {
        LogError::HashFunctionError(format!(
            "expected {}-byte digest, got {} bytes",
            HASH_LEN,
            bytes.len()
        ))
    })
}

pub fn decode_hashes(encoded: &[String]) -> Result<Vec<NodeHash>, LogError> {
    encoded.iter().map(|h| decode_hash(h)).collect()
}

/// Abbreviated hex used in debug renderings of the tree
pub fn short_hex(hash: &NodeHash) -> String {
    hex::encode(&hash[..SHORT_HEX_LEN])
}
