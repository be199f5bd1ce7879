//! Log Service
//!
//! Owns the Merkle tree behind a single lock and exposes it through
//! [`LogServerInterface`], the surface remote callers and the auditor use.

pub mod client;
pub mod server;
pub mod wire;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::LogError;
use crate::hashing::NodeHash;
use crate::tree::MerkleTree;

pub use client::LogClient;

/// Operations a log server offers to its callers
#[async_trait]
pub trait LogServerInterface: Send + Sync {
    async fn get_root_hash(&self) -> Result<NodeHash, LogError>;

    async fn get_size(&self) -> Result<usize, LogError>;

    async fn append_log(&self, content: &[u8]) -> Result<(), LogError>;

    /// Append entries in order as one batch
    async fn append_logs(&self, contents: &[Vec<u8>]) -> Result<(), LogError>;

    async fn gen_path(&self, index: usize) -> Result<Vec<NodeHash>, LogError>;

    /// Consistency proof against an earlier size; negative sizes are out of range
    async fn gen_proof(&self, prior_size: i64) -> Result<Vec<NodeHash>, LogError>;
}

/// Point-in-time view of the tree for operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeStatus {
    pub root: NodeHash,
    pub size: usize,
    pub capacity: usize,
    pub height: u32,
}

/// In-process log server. Clones share the same tree.
#[derive(Clone)]
pub struct LogService {
    tree: Arc<Mutex<MerkleTree>>,
}

impl LogService {
    pub fn new(tree: MerkleTree) -> Self {
        Self {
            tree: Arc::new(Mutex::new(tree)),
        }
    }

    /// Seed the log with one entry per line
    pub fn from_text(log: &str) -> Self {
        let tree = MerkleTree::from_text(log);
        info!("Log service seeded with {} entries", tree.size());
        Self::new(tree)
    }

    pub async fn status(&self) -> TreeStatus {
        let tree = self.tree.lock().await;
        TreeStatus {
            root: tree.root_hash(),
            size: tree.size(),
            capacity: tree.capacity(),
            height: tree.height(),
        }
    }

    /// Debug rendering of the whole tree
    pub async fn render(&self) -> String {
        self.tree.lock().await.to_string()
    }
}

#[async_trait]
impl LogServerInterface for LogService {
    async fn get_root_hash(&self) -> Result<NodeHash, LogError> {
        Ok(self.tree.lock().await.root_hash())
    }

    async fn get_size(&self) -> Result<usize, LogError> {
        Ok(self.tree.lock().await.size())
    }

    async fn append_log(&self, content: &[u8]) -> Result<(), LogError> {
        let index = self.tree.lock().await.append(content);
        debug!("Appended log entry at index {}", index);
        Ok(())
    }

    async fn append_logs(&self, contents: &[Vec<u8>]) -> Result<(), LogError> {
        let mut tree = self.tree.lock().await;
        for content in contents {
            tree.append(content);
        }
        info!("Appended batch of {} log entries (size {})", contents.len(), tree.size());
        Ok(())
    }

    async fn gen_path(&self, index: usize) -> Result<Vec<NodeHash>, LogError> {
        self.tree.lock().await.get_path(index)
    }

    async fn gen_proof(&self, prior_size: i64) -> Result<Vec<NodeHash>, LogError> {
        let tree = self.tree.lock().await;
        let size = usize::try_from(prior_size)
            .map_err(|_| LogError::size_out_of_range(prior_size, tree.capacity()))?;
        tree.get_proof(size)
    }
}
