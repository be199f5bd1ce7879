//! Log Auditor
//!
//! Checks log membership against a root it has observed itself, trusting the
//! server only for the inclusion paths it hands out.
//!
//! The snapshot refresh reads the size and then the root in two separate
//! calls. Appends landing between those calls, or during a scan, leave the
//! snapshot and the fetched paths out of step, which shows up as a false
//! "not a member" rather than a false positive.

use tracing::{debug, info};

use crate::error::LogError;
use crate::hashing::{leaf_hash, NodeHash};
use crate::service::LogServerInterface;
use crate::tree::{verify_consistency, verify_inclusion, ConsistencyCheck};

/// Root and size the auditor last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub root: NodeHash,
    pub size: usize,
}

pub struct Auditor<S> {
    server: S,
    root: NodeHash,
    size: usize,
}

impl<S: LogServerInterface> Auditor<S> {
    /// Create an auditor primed with the server's current root and size
    pub async fn new(server: S) -> Result<Self, LogError> {
        let root = server.get_root_hash().await?;
        let size = server.get_size().await?;
        Ok(Self { server, root, size })
    }

    pub fn root(&self) -> &NodeHash {
        &self.root
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            root: self.root,
            size: self.size,
        }
    }

    pub fn server(&self) -> &S {
        &self.server
    }

    pub async fn refresh(&mut self) -> Result<(), LogError> {
        self.size = self.server.get_size().await?;
        self.root = self.server.get_root_hash().await?;
        Ok(())
    }

    /// Check whether `content` appears anywhere in the log.
    ///
    /// The position is unknown, so every index is tried in turn. An error
    /// means the answer is indeterminate, not that the entry is absent.
    pub async fn is_member(&mut self, content: &[u8]) -> Result<bool, LogError> {
        self.refresh().await?;
        let target = leaf_hash(content);

        for index in 0..self.size {
            let path = self.server.gen_path(index).await?;
            if self.verify_path(&path, &target, index) {
                debug!("Entry verified at index {}", index);
                return Ok(true);
            }
        }

        info!("Entry not found among {} log entries", self.size);
        Ok(false)
    }

    /// Check `content` at a known index against the cached root
    pub async fn is_member_at(&self, content: &[u8], index: usize) -> Result<bool, LogError> {
        if index >= self.size {
            return Ok(false);
        }
        let path = self.server.gen_path(index).await?;
        Ok(self.verify_path(&path, &leaf_hash(content), index))
    }

    /// Recompute the root from `path` and compare it to the cached root
    pub fn verify_path(&self, path: &[NodeHash], candidate: &NodeHash, index: usize) -> bool {
        verify_inclusion(path, candidate, index, &self.root)
    }

    /// Refresh the snapshot and check that `earlier` is a prefix of the log
    pub async fn check_consistency(&mut self, earlier: &Snapshot) -> Result<ConsistencyCheck, LogError> {
        self.refresh().await?;
        if earlier.size > self.size {
            return Ok(ConsistencyCheck::Inconsistent);
        }

        let proof = self.server.gen_proof(earlier.size as i64).await?;
        let check = verify_consistency(earlier.size, &earlier.root, self.size, &self.root, &proof);
        info!(
            "Consistency from size {} to {}: {:?}",
            earlier.size, self.size, check
        );
        Ok(check)
    }
}
