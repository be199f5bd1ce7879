pub mod auditor;
pub mod config;
pub mod error;
pub mod hashing;
pub mod service;
pub mod tree;

pub use auditor::{Auditor, Snapshot};
pub use error::LogError;
pub use service::{LogClient, LogServerInterface, LogService};
pub use tree::MerkleTree;
