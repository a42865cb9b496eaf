use daemon::{ConfigError, DaemonError};
use networks::UnknownNetwork;
use primitives::DecodeError;
use store::StoreError;
use thiserror::Error;

/// Everything that can take the node down or abort a sync pass.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    UnknownNetwork(#[from] UnknownNetwork),
    #[error("invalid genesis block: {0}")]
    InvalidGenesis(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Daemon(#[from] DaemonError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Chain(#[from] chain::ChainError),
    #[error("failed to fetch block {height}: {source}")]
    BlockFetch {
        height: u64,
        #[source]
        source: DaemonError,
    },
    #[error("block {height} from the daemon is malformed: {source}")]
    BlockDecode {
        height: u64,
        #[source]
        source: DecodeError,
    },
    #[error("failed to apply block {height}: {source}")]
    BlockApply {
        height: u64,
        #[source]
        source: StoreError,
    },
    #[error("node stopped after a component failure: {0}")]
    ComponentFailure(String),
}
