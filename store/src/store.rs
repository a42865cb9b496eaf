use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use chain::{ChainError, ChainMetadata, ChainState, MetadataError, MetadataStore};
use daemon::{DaemonError, Supervisor};
use networks::{NetworkParams, NetworkRegistry, UnknownNetwork};
use primitives::{Block, DecodeError};

use crate::paths::database_path;

const METADATA_FILE: &str = "metadata.json";
const BLOCKS_DIR: &str = "blocks";
const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Decodes raw daemon bytes into a block. Installed by the
/// orchestrator so the store stays agnostic of the wire format.
pub type BlockDecoder = fn(&[u8]) -> Result<Block, DecodeError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store used before its collaborators were wired")]
    NotWired,
    #[error("store io on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store metadata encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored block is malformed: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Daemon(#[from] DaemonError),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Lifecycle events reported to the orchestrator.
#[derive(Debug)]
pub enum StoreEvent {
    Ready,
    Error(StoreError),
}

pub struct Store {
    db_path: PathBuf,
    network: String,
    chain: OnceLock<Arc<ChainState>>,
    daemon: OnceLock<Arc<Supervisor>>,
    decoder: OnceLock<BlockDecoder>,
    daemon_start_height: Mutex<Option<u64>>,
    // Serializes apply_block so file write and tip advance stay paired.
    write_lock: Mutex<()>,
    events: mpsc::Sender<StoreEvent>,
}

/// Binds a database directory for the given network.
///
/// The network must be resolvable through the registry; the directory
/// itself is created later by [`Store::initialize`].
pub fn bind_database(
    registry: &NetworkRegistry,
    params: &NetworkParams,
    data_dir: &Path,
) -> Result<(Arc<Store>, mpsc::Receiver<StoreEvent>), UnknownNetwork> {
    if !registry.contains(&params.name) {
        return Err(UnknownNetwork(params.name.clone()));
    }
    let db_path = database_path(registry, params, data_dir);
    let (events, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let store = Arc::new(Store {
        db_path,
        network: params.name.clone(),
        chain: OnceLock::new(),
        daemon: OnceLock::new(),
        decoder: OnceLock::new(),
        daemon_start_height: Mutex::new(None),
        write_lock: Mutex::new(()),
        events,
    });
    Ok((store, events_rx))
}

impl Store {
    /// Wire the chain-state, daemon and decoder. Called once by the
    /// orchestrator; later calls are ignored.
    pub fn attach(&self, chain: Arc<ChainState>, daemon: Arc<Supervisor>, decoder: BlockDecoder) {
        let _ = self.chain.set(chain);
        let _ = self.daemon.set(daemon);
        let _ = self.decoder.set(decoder);
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// The daemon height observed during initialization.
    pub fn daemon_start_height(&self) -> Option<u64> {
        *self.daemon_start_height.lock()
    }

    /// Create the database layout and take the daemon's starting
    /// height. Emits exactly one [`StoreEvent`].
    pub async fn initialize(&self) {
        let event = match self.initialize_inner().await {
            Ok(height) => {
                info!(network = %self.network, path = %self.db_path.display(), height, "store ready");
                StoreEvent::Ready
            }
            Err(err) => {
                error!(%err, "store initialization failed");
                StoreEvent::Error(err)
            }
        };
        let _ = self.events.send(event).await;
    }

    async fn initialize_inner(&self) -> Result<u64, StoreError> {
        let blocks_dir = self.db_path.join(BLOCKS_DIR);
        std::fs::create_dir_all(&blocks_dir).map_err(|source| StoreError::Io {
            path: blocks_dir,
            source,
        })?;

        let daemon = self.daemon.get().ok_or(StoreError::NotWired)?;
        let info = daemon.get_info().await?;
        *self.daemon_start_height.lock() = Some(info.height);
        Ok(info.height)
    }

    /// Persist a block as the next tip.
    ///
    /// The block file and the updated metadata hit disk before the
    /// chain tip moves, so a crash can lose a tip advance but never
    /// point the tip at a block that was not written.
    pub async fn apply_block(&self, block: &Block) -> Result<u64, StoreError> {
        let chain = self.chain.get().ok_or(StoreError::NotWired)?;
        let _guard = self.write_lock.lock();

        let height = chain.tip().height + 1;
        let hash = block.hash();
        let path = self.block_path(height);
        write_file_atomic(&path, &block.encode()).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        let metadata = ChainMetadata {
            tip_height: height,
            tip_hash: hash.to_hex(),
            genesis_hash: chain.genesis_hash().to_hex(),
        };
        self.write_metadata(&metadata)?;
        chain.advance_tip(height, hash)?;
        debug!(height, hash = %hash, "block stored");
        Ok(height)
    }

    /// Fetch a stored block by height, decoded through the installed
    /// decoder. Heights that were never stored yield `None`.
    pub fn get_block(&self, height: u64) -> Result<Option<Block>, StoreError> {
        let decoder = self.decoder.get().ok_or(StoreError::NotWired)?;
        let path = self.block_path(height);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Some(decoder(&raw)?))
    }

    /// Flush and release the database. Writes are already synchronous,
    /// so this only marks the lifecycle boundary.
    pub fn close(&self) {
        info!(network = %self.network, "store closed");
    }

    fn block_path(&self, height: u64) -> PathBuf {
        self.db_path.join(BLOCKS_DIR).join(format!("{height:08}.dat"))
    }

    fn metadata_path(&self) -> PathBuf {
        self.db_path.join(METADATA_FILE)
    }

    fn write_metadata(&self, metadata: &ChainMetadata) -> Result<(), StoreError> {
        let path = self.metadata_path();
        let json = serde_json::to_vec_pretty(metadata)?;
        write_file_atomic(&path, &json).map_err(|source| StoreError::Io { path, source })
    }
}

impl MetadataStore for Store {
    fn save_metadata(&self, metadata: &ChainMetadata) -> Result<(), MetadataError> {
        self.write_metadata(metadata)
            .map_err(|err| MetadataError(err.to_string()))
    }

    fn load_metadata(&self) -> Result<Option<ChainMetadata>, MetadataError> {
        let path = self.metadata_path();
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(MetadataError(format!("read {}: {err}", path.display()))),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|err| MetadataError(format!("parse {}: {err}", path.display())))
    }
}

/// Write via a sibling tmp file and rename, so readers never observe a
/// partially written file.
fn write_file_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}
