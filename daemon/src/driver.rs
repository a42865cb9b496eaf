use async_trait::async_trait;
use primitives::BlockHash;
use thiserror::Error;

/// Snapshot of the daemon's view of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonInfo {
    pub height: u64,
}

/// Identifies a block when asking the daemon for its raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Height(u64),
    Hash(BlockHash),
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockRef::Height(h) => write!(f, "height {h}"),
            BlockRef::Hash(hash) => write!(f, "hash {hash}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("daemon failed to start: {0}")]
    Startup(String),
    #[error("daemon rpc transport failed: {0}")]
    Transport(String),
    #[error("daemon rpc returned an error: {0}")]
    Rpc(String),
    #[error("daemon returned a malformed response: {0}")]
    BadResponse(String),
    #[error("block {0} not found on the daemon")]
    BlockNotFound(BlockRef),
}

/// Transport-agnostic daemon boundary.
///
/// Production use talks JSON-RPC over HTTP ([`crate::RpcDriver`]);
/// tests substitute scripted drivers.
#[async_trait]
pub trait DaemonDriver: Send + Sync {
    /// Launches (or connects to) the daemon process.
    async fn start(&self) -> Result<(), DaemonError>;

    /// Asks the daemon to shut down. Best effort.
    async fn stop(&self) -> Result<(), DaemonError>;

    /// Current chain info as the daemon sees it.
    async fn get_info(&self) -> Result<DaemonInfo, DaemonError>;

    /// Fetches the raw serialized block for `block`.
    async fn get_block(&self, block: BlockRef) -> Result<Vec<u8>, DaemonError>;
}
