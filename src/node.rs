use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use chain::{ChainEvent, MetadataStore};
use daemon::{load_daemon_config, ConfigValue, DaemonDriver, DaemonEvent, NodeConfig, Supervisor};
use networks::NetworkRegistry;
use primitives::Block;
use store::{bind_database, Store, StoreEvent};

use crate::consensus::resolve_consensus;
use crate::error::NodeError;
use crate::sync::SyncEngine;

const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Node lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Created,
    ConfigLoaded,
    ComponentsWired,
    Starting,
    Ready,
    Failed,
}

impl NodeState {
    /// Check if a transition to the target state is valid.
    pub fn can_transition_to(&self, target: NodeState) -> bool {
        match self {
            NodeState::Created => matches!(target, NodeState::ConfigLoaded | NodeState::Failed),
            NodeState::ConfigLoaded => {
                matches!(target, NodeState::ComponentsWired | NodeState::Failed)
            }
            NodeState::ComponentsWired => matches!(target, NodeState::Starting | NodeState::Failed),
            NodeState::Starting => matches!(target, NodeState::Ready | NodeState::Failed),
            NodeState::Ready => matches!(target, NodeState::Failed),
            NodeState::Failed => false,
        }
    }
}

/// Events surfaced to whoever embeds the node.
#[derive(Debug)]
pub enum NodeEvent {
    /// Every component reported ready.
    Ready,
    /// A sync pass caught the tip up to the daemon.
    Synced { height: u64 },
    Error(NodeError),
}

/// Everything the node needs before it can start.
pub struct NodeSettings {
    pub registry: NetworkRegistry,
    pub network: Option<String>,
    pub data_dir: PathBuf,
    pub genesis_override: Option<String>,
    pub config_overrides: BTreeMap<String, ConfigValue>,
}

/// Builds the daemon driver once the merged configuration is known.
pub type DriverFactory = Box<dyn Fn(&NodeConfig) -> Arc<dyn DaemonDriver> + Send + Sync>;

/// Control surface handed to the embedder while [`Node::run`] owns the
/// event loop.
#[derive(Clone)]
pub struct NodeHandle {
    trigger: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
}

impl NodeHandle {
    /// Hint that the daemon has a new block. Coalesces: a pass already
    /// pending absorbs further hints.
    pub fn notify_block(&self) {
        let _ = self.trigger.try_send(());
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

pub struct Node {
    settings: NodeSettings,
    driver_factory: DriverFactory,
    state: NodeState,
    events: mpsc::Sender<NodeEvent>,
    trigger: mpsc::Receiver<()>,
    shutdown: watch::Receiver<bool>,
}

impl Node {
    pub fn new(
        settings: NodeSettings,
        driver_factory: DriverFactory,
    ) -> (Self, NodeHandle, mpsc::Receiver<NodeEvent>) {
        let (events, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let node = Node {
            settings,
            driver_factory,
            state: NodeState::Created,
            events,
            trigger: trigger_rx,
            shutdown: shutdown_rx,
        };
        let handle = NodeHandle {
            trigger: trigger_tx,
            shutdown: shutdown_tx,
        };
        (node, handle, events_rx)
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Bring the node up and serve its event loop until shutdown.
    ///
    /// Setup faults are returned directly; once the components run,
    /// their failures also arrive as [`NodeEvent::Error`] so an
    /// embedder watching the event stream sees every outcome.
    pub async fn run(mut self) -> Result<(), NodeError> {
        match self.run_inner().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.transition(NodeState::Failed);
                error!(%err, "node failed");
                Err(err)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<(), NodeError> {
        // Stage 1: resolve consensus and merge configuration.
        let (params, chain, mut chain_events) = resolve_consensus(
            &self.settings.registry,
            self.settings.network.as_deref(),
            self.settings.genesis_override.as_deref(),
        )?;
        let file_config = load_daemon_config(&self.settings.data_dir)?;
        let config = NodeConfig::build(
            &params,
            self.settings.data_dir.clone(),
            file_config,
            self.settings.config_overrides.clone(),
        );
        self.transition(NodeState::ConfigLoaded);

        // Stage 2: wire the components together.
        let driver = (self.driver_factory)(&config);
        let (supervisor, mut daemon_events) = Supervisor::new(driver, config);
        let (db, mut store_events) =
            bind_database(&self.settings.registry, &params, &self.settings.data_dir)?;
        db.attach(Arc::clone(&chain), Arc::clone(&supervisor), Block::decode);
        let metadata_link: Arc<dyn MetadataStore> = Arc::clone(&db) as Arc<dyn MetadataStore>;
        chain.attach_store(Arc::downgrade(&metadata_link));
        drop(metadata_link);
        let sync = SyncEngine::new(Arc::clone(&chain), Arc::clone(&db), Arc::clone(&supervisor));
        self.transition(NodeState::ComponentsWired);

        // Stage 3: launch the daemon; the rest follows its readiness.
        supervisor.start();
        self.transition(NodeState::Starting);

        // Stage 4: drive readiness and serve sync triggers.
        let mut store_started = false;
        let mut daemon_height = 0u64;
        loop {
            tokio::select! {
                Some(event) = daemon_events.recv() => match event {
                    DaemonEvent::Ready { height } => {
                        daemon_height = height;
                        if !store_started {
                            store_started = true;
                            db.initialize().await;
                        }
                    }
                    DaemonEvent::Error(err) => {
                        return self.fail(err.into(), &supervisor, &db).await;
                    }
                },
                Some(event) = store_events.recv() => match event {
                    StoreEvent::Ready => chain.initialize().await,
                    StoreEvent::Error(err) => {
                        return self.fail(err.into(), &supervisor, &db).await;
                    }
                },
                Some(event) = chain_events.recv() => match event {
                    ChainEvent::Ready => {
                        self.transition(NodeState::Ready);
                        info!(
                            tip = chain.tip().height,
                            daemon = daemon_height,
                            "node ready"
                        );
                        let _ = self.events.send(NodeEvent::Ready).await;
                        self.sync_pass(&sync).await;
                    }
                    ChainEvent::Error(err) => {
                        return self.fail(err.into(), &supervisor, &db).await;
                    }
                },
                Some(()) = self.trigger.recv() => {
                    if self.state == NodeState::Ready {
                        self.sync_pass(&sync).await;
                    } else {
                        debug!(state = ?self.state, "block hint before readiness ignored");
                    }
                },
                changed = self.shutdown.changed() => {
                    // A dropped handle counts as a shutdown request.
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("shutdown requested");
                        Self::stop_components(&supervisor, &db).await;
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Run one sync pass and surface its outcome as an event. A failed
    /// pass is recoverable: the engine resets and the next block hint
    /// retries from the tip.
    async fn sync_pass(&self, sync: &SyncEngine) {
        match sync.run_pass().await {
            Ok(height) => {
                let _ = self.events.send(NodeEvent::Synced { height }).await;
            }
            Err(err) => {
                warn!(%err, "sync pass aborted");
                let _ = self.events.send(NodeEvent::Error(err)).await;
            }
        }
    }

    /// A component fault during startup is fatal: surface it on the
    /// event stream, stop what already runs, and end the loop.
    async fn fail(
        &mut self,
        err: NodeError,
        supervisor: &Arc<Supervisor>,
        db: &Arc<Store>,
    ) -> Result<(), NodeError> {
        let message = err.to_string();
        let _ = self.events.send(NodeEvent::Error(err)).await;
        Self::stop_components(supervisor, db).await;
        Err(NodeError::ComponentFailure(message))
    }

    async fn stop_components(supervisor: &Arc<Supervisor>, db: &Arc<Store>) {
        if let Err(err) = supervisor.stop().await {
            warn!(%err, "daemon did not stop cleanly");
        }
        db.close();
    }

    fn transition(&mut self, target: NodeState) {
        if self.state == target {
            return;
        }
        if !self.state.can_transition_to(target) {
            warn!(from = ?self.state, to = ?target, "invalid node state transition dropped");
            return;
        }
        debug!(from = ?self.state, to = ?target, "node state transition");
        self.state = target;
    }
}
