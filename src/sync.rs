use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use chain::ChainState;
use daemon::{BlockRef, Supervisor};
use primitives::Block;
use store::Store;

use crate::error::NodeError;

/// Sync engine state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No sync pass running and the tip has not been compared against
    /// the daemon yet.
    #[default]
    Idle,

    /// Actively pulling blocks from the daemon one height at a time.
    Syncing,

    /// The tip matched the daemon height at the end of the last pass.
    Synced,
}

impl SyncState {
    /// Check if a transition to the target state is valid.
    pub fn can_transition_to(&self, target: SyncState) -> bool {
        match self {
            SyncState::Idle => matches!(target, SyncState::Syncing | SyncState::Synced),
            SyncState::Syncing => matches!(target, SyncState::Synced | SyncState::Idle),
            SyncState::Synced => matches!(target, SyncState::Syncing | SyncState::Idle),
        }
    }
}

/// One observation of how far the tip trails the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCursor {
    pub current: u64,
    pub target: u64,
}

impl SyncCursor {
    pub fn behind(&self) -> u64 {
        self.target.saturating_sub(self.current)
    }
}

/// Reconciles the chain tip against the daemon height.
///
/// Each pass re-reads the daemon height after every applied block, so
/// blocks arriving mid-pass extend the same pass instead of waiting
/// for the next trigger. A pass settles to `Synced` exactly once; any
/// failure aborts the pass with the tip left at the last applied
/// block.
pub struct SyncEngine {
    chain: Arc<ChainState>,
    store: Arc<Store>,
    daemon: Arc<Supervisor>,
    state: Mutex<SyncState>,
}

impl SyncEngine {
    pub fn new(chain: Arc<ChainState>, store: Arc<Store>, daemon: Arc<Supervisor>) -> Self {
        SyncEngine {
            chain,
            store,
            daemon,
            state: Mutex::new(SyncState::Idle),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Where the tip stands against the daemon right now.
    pub async fn cursor(&self) -> Result<SyncCursor, NodeError> {
        let info = self.daemon.get_info().await?;
        Ok(SyncCursor {
            current: self.chain.tip().height,
            target: info.height,
        })
    }

    /// Run one sync pass to the daemon's current height.
    ///
    /// Returns the tip height the pass ended at. On failure the state
    /// drops back to `Idle` so the next trigger starts a fresh pass.
    pub async fn run_pass(&self) -> Result<u64, NodeError> {
        self.transition(SyncState::Syncing);
        match self.pull_to_target().await {
            Ok(height) => {
                self.transition(SyncState::Synced);
                info!(height, "sync pass complete");
                Ok(height)
            }
            Err(err) => {
                self.transition(SyncState::Idle);
                Err(err)
            }
        }
    }

    async fn pull_to_target(&self) -> Result<u64, NodeError> {
        loop {
            let cursor = self.cursor().await?;
            if cursor.current >= cursor.target {
                return Ok(cursor.current);
            }
            debug!(current = cursor.current, target = cursor.target, "tip behind daemon");

            let height = cursor.current + 1;
            let raw = self
                .daemon
                .get_block(BlockRef::Height(height))
                .await
                .map_err(|source| NodeError::BlockFetch { height, source })?;
            let block = Block::decode(&raw)
                .map_err(|source| NodeError::BlockDecode { height, source })?;
            self.store
                .apply_block(&block)
                .await
                .map_err(|source| NodeError::BlockApply { height, source })?;
        }
    }

    fn transition(&self, target: SyncState) {
        let mut state = self.state.lock();
        if *state == target {
            return;
        }
        if !state.can_transition_to(target) {
            warn!(from = ?*state, to = ?target, "invalid sync state transition dropped");
            return;
        }
        debug!(from = ?*state, to = ?target, "sync state transition");
        *state = target;
    }
}
