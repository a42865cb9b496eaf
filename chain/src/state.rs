use std::fmt;
use std::sync::{OnceLock, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use primitives::{Block, BlockHash};

// Lifecycle traffic is a handful of events, so a small bound suffices.
const EVENT_CHANNEL_CAPACITY: usize = 8;

#[derive(Debug, Error)]
#[error("metadata store: {0}")]
pub struct MetadataError(pub String);

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain-state used before the store link was wired")]
    NotWired,
    #[error("stored metadata belongs to genesis {stored}, chain was seeded with {seeded}")]
    GenesisMismatch { stored: String, seeded: String },
    #[error("tip advance to height {attempted} is not tip + 1 (tip is {tip})")]
    NonMonotonicTip { tip: u64, attempted: u64 },
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

/// Lifecycle events reported to the orchestrator.
#[derive(Debug)]
pub enum ChainEvent {
    Ready,
    Error(ChainError),
}

/// The canonical tip: height plus hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tip {
    pub height: u64,
    pub hash: BlockHash,
}

/// Chain metadata persisted through the store link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetadata {
    pub tip_height: u64,
    pub tip_hash: String,
    pub genesis_hash: String,
}

/// Non-owning persistence seam. Implemented by the store; the chain
/// holds it as a `Weak` so the mutual back-references cannot leak.
pub trait MetadataStore: Send + Sync {
    fn save_metadata(&self, metadata: &ChainMetadata) -> Result<(), MetadataError>;
    fn load_metadata(&self) -> Result<Option<ChainMetadata>, MetadataError>;
}

pub struct ChainState {
    genesis: Block,
    tip: Mutex<Tip>,
    store: OnceLock<Weak<dyn MetadataStore>>,
    events: mpsc::Sender<ChainEvent>,
}

impl ChainState {
    /// Seed a chain with its genesis block. The tip starts at the
    /// genesis until metadata says otherwise.
    pub fn new(genesis: Block) -> (Self, mpsc::Receiver<ChainEvent>) {
        let (events, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let tip = Tip {
            height: 0,
            hash: genesis.hash(),
        };
        (
            ChainState {
                genesis,
                tip: Mutex::new(tip),
                store: OnceLock::new(),
                events,
            },
            events_rx,
        )
    }

    /// Wire the persistence back-link. Called once by the orchestrator;
    /// later calls are ignored.
    pub fn attach_store(&self, store: Weak<dyn MetadataStore>) {
        let _ = self.store.set(store);
    }

    pub fn tip(&self) -> Tip {
        *self.tip.lock()
    }

    pub fn genesis(&self) -> &Block {
        &self.genesis
    }

    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis.hash()
    }

    /// Load (or seed) persisted metadata and report readiness.
    ///
    /// Requires the store to be live: the tip recorded in metadata is
    /// only trustworthy against stored blocks, which is why the
    /// orchestrator starts the store first.
    pub async fn initialize(&self) {
        let result = self.initialize_inner();
        let event = match result {
            Ok(()) => ChainEvent::Ready,
            Err(err) => ChainEvent::Error(err),
        };
        // The orchestrator holds the receiver for the node's lifetime.
        let _ = self.events.send(event).await;
    }

    fn initialize_inner(&self) -> Result<(), ChainError> {
        let store = self.store_link()?;
        match store.load_metadata()? {
            Some(metadata) => {
                let seeded = self.genesis_hash().to_hex();
                if metadata.genesis_hash != seeded {
                    return Err(ChainError::GenesisMismatch {
                        stored: metadata.genesis_hash,
                        seeded,
                    });
                }
                let hash: BlockHash = metadata
                    .tip_hash
                    .parse()
                    .map_err(|_| MetadataError(format!("bad tip hash {:?}", metadata.tip_hash)))?;
                let mut tip = self.tip.lock();
                tip.height = metadata.tip_height;
                tip.hash = hash;
                info!(height = tip.height, hash = %tip.hash, "Chain tip restored from metadata");
            }
            None => {
                self.save_metadata()?;
                info!(genesis = %self.genesis_hash(), "Chain metadata seeded at genesis");
            }
        }
        Ok(())
    }

    /// Advance the tip by exactly one block.
    ///
    /// Only the persistence component calls this, and only after its
    /// write succeeded; anything other than `tip + 1` is a bug upstream.
    pub fn advance_tip(&self, height: u64, hash: BlockHash) -> Result<(), ChainError> {
        let mut tip = self.tip.lock();
        if height != tip.height + 1 {
            return Err(ChainError::NonMonotonicTip {
                tip: tip.height,
                attempted: height,
            });
        }
        tip.height = height;
        tip.hash = hash;
        debug!(height, hash = %hash, "Tip advanced");
        Ok(())
    }

    /// Persist the current tip through the store link.
    pub fn save_metadata(&self) -> Result<(), ChainError> {
        let store = self.store_link()?;
        let tip = self.tip();
        store.save_metadata(&ChainMetadata {
            tip_height: tip.height,
            tip_hash: tip.hash.to_hex(),
            genesis_hash: self.genesis_hash().to_hex(),
        })?;
        Ok(())
    }

    pub fn metadata(&self) -> ChainMetadata {
        let tip = self.tip();
        ChainMetadata {
            tip_height: tip.height,
            tip_hash: tip.hash.to_hex(),
            genesis_hash: self.genesis_hash().to_hex(),
        }
    }

    fn store_link(&self) -> Result<std::sync::Arc<dyn MetadataStore>, ChainError> {
        self.store
            .get()
            .and_then(Weak::upgrade)
            .ok_or(ChainError::NotWired)
    }
}

// Manual impl: the `Weak<dyn MetadataStore>` link has no Debug.
impl fmt::Debug for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainState")
            .field("genesis", &self.genesis_hash())
            .field("tip", &self.tip())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex as PlMutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use primitives::BlockHeader;

    fn test_genesis() -> Block {
        Block {
            header: BlockHeader {
                version: 1,
                prev_block: BlockHash::ZERO,
                merkle_root: [0u8; 32],
                time: 1,
                bits: 0x207fffff,
                nonce: 0,
            },
            tx_count: 1,
            raw_txs: vec![0u8; 4],
        }
    }

    #[derive(Default)]
    struct MemoryMetadata {
        saved: PlMutex<Option<ChainMetadata>>,
    }

    impl MetadataStore for MemoryMetadata {
        fn save_metadata(&self, metadata: &ChainMetadata) -> Result<(), MetadataError> {
            *self.saved.lock() = Some(metadata.clone());
            Ok(())
        }

        fn load_metadata(&self) -> Result<Option<ChainMetadata>, MetadataError> {
            Ok(self.saved.lock().clone())
        }
    }

    #[test]
    fn debug_reports_genesis_and_tip() {
        // Results carrying a ChainState must be usable with
        // expect/unwrap in tests, which needs a Debug rendering.
        let (chain, _rx) = ChainState::new(test_genesis());
        let rendered = format!("{chain:?}");
        assert!(rendered.contains("ChainState"));
        assert!(rendered.contains(&chain.genesis_hash().to_hex()));
    }

    #[test]
    fn tip_starts_at_genesis() {
        let genesis = test_genesis();
        let expected = genesis.hash();
        let (chain, _rx) = ChainState::new(genesis);
        assert_eq!(chain.tip(), Tip { height: 0, hash: expected });
    }

    #[test]
    fn advance_tip_requires_exactly_next_height() {
        let (chain, _rx) = ChainState::new(test_genesis());
        let hash = BlockHash([7u8; 32]);

        assert!(matches!(
            chain.advance_tip(2, hash),
            Err(ChainError::NonMonotonicTip { tip: 0, attempted: 2 })
        ));
        assert_eq!(chain.tip().height, 0);

        chain.advance_tip(1, hash).unwrap();
        assert_eq!(chain.tip(), Tip { height: 1, hash });

        // Re-applying the same height is also rejected.
        assert!(chain.advance_tip(1, hash).is_err());
    }

    #[tokio::test]
    async fn initialize_without_store_reports_error() {
        let (chain, mut rx) = ChainState::new(test_genesis());
        chain.initialize().await;
        assert!(matches!(
            rx.recv().await,
            Some(ChainEvent::Error(ChainError::NotWired))
        ));
    }

    #[tokio::test]
    async fn initialize_seeds_metadata_when_absent() {
        let (chain, mut rx) = ChainState::new(test_genesis());
        let store: Arc<dyn MetadataStore> = Arc::new(MemoryMetadata::default());
        chain.attach_store(Arc::downgrade(&store));

        chain.initialize().await;
        assert!(matches!(rx.recv().await, Some(ChainEvent::Ready)));

        let saved = store.load_metadata().unwrap().unwrap();
        assert_eq!(saved.tip_height, 0);
        assert_eq!(saved.genesis_hash, chain.genesis_hash().to_hex());
    }

    #[tokio::test]
    async fn initialize_restores_persisted_tip() {
        let genesis = test_genesis();
        let tip_hash = BlockHash([9u8; 32]);
        let store: Arc<dyn MetadataStore> = Arc::new(MemoryMetadata::default());
        store
            .save_metadata(&ChainMetadata {
                tip_height: 42,
                tip_hash: tip_hash.to_hex(),
                genesis_hash: genesis.hash().to_hex(),
            })
            .unwrap();

        let (chain, mut rx) = ChainState::new(genesis);
        chain.attach_store(Arc::downgrade(&store));
        chain.initialize().await;

        assert!(matches!(rx.recv().await, Some(ChainEvent::Ready)));
        assert_eq!(chain.tip(), Tip { height: 42, hash: tip_hash });
    }

    #[tokio::test]
    async fn initialize_rejects_foreign_metadata() {
        let store: Arc<dyn MetadataStore> = Arc::new(MemoryMetadata::default());
        store
            .save_metadata(&ChainMetadata {
                tip_height: 1,
                tip_hash: BlockHash::ZERO.to_hex(),
                genesis_hash: BlockHash([1u8; 32]).to_hex(),
            })
            .unwrap();

        let (chain, mut rx) = ChainState::new(test_genesis());
        chain.attach_store(Arc::downgrade(&store));
        chain.initialize().await;

        assert!(matches!(
            rx.recv().await,
            Some(ChainEvent::Error(ChainError::GenesisMismatch { .. }))
        ));
        // A rejected initialize leaves the tip at genesis.
        assert_eq!(chain.tip().height, 0);
    }
}
