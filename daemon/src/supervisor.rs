use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::NodeConfig;
use crate::driver::{BlockRef, DaemonDriver, DaemonError, DaemonInfo};

const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Lifecycle notifications from the supervised daemon.
#[derive(Debug)]
pub enum DaemonEvent {
    /// The daemon started and answered its first info query.
    Ready { height: u64 },
    Error(DaemonError),
}

/// Owns the daemon driver and reports its lifecycle to the node.
///
/// `start` runs the startup sequence on a spawned task and emits
/// exactly one [`DaemonEvent`] when it settles; queries proxy straight
/// through to the driver afterwards.
pub struct Supervisor {
    driver: Arc<dyn DaemonDriver>,
    config: NodeConfig,
    events: mpsc::Sender<DaemonEvent>,
}

impl Supervisor {
    pub fn new(
        driver: Arc<dyn DaemonDriver>,
        config: NodeConfig,
    ) -> (Arc<Self>, mpsc::Receiver<DaemonEvent>) {
        let (events, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let supervisor = Arc::new(Self {
            driver,
            config,
            events,
        });
        (supervisor, receiver)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Starts the daemon in the background. The outcome arrives on the
    /// event channel.
    pub fn start(self: &Arc<Self>) {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            let event = match supervisor.startup().await {
                Ok(info) => {
                    info!(height = info.height, network = %supervisor.config.network, "daemon ready");
                    DaemonEvent::Ready {
                        height: info.height,
                    }
                }
                Err(err) => {
                    error!(%err, "daemon startup failed");
                    DaemonEvent::Error(err)
                }
            };
            // Receiver dropped means the node is already shutting down.
            let _ = supervisor.events.send(event).await;
        });
    }

    async fn startup(&self) -> Result<DaemonInfo, DaemonError> {
        self.driver.start().await?;
        self.driver.get_info().await
    }

    pub async fn get_info(&self) -> Result<DaemonInfo, DaemonError> {
        self.driver.get_info().await
    }

    pub async fn get_block(&self, block: BlockRef) -> Result<Vec<u8>, DaemonError> {
        self.driver.get_block(block).await
    }

    pub async fn stop(&self) -> Result<(), DaemonError> {
        info!(network = %self.config.network, "stopping daemon");
        self.driver.stop().await
    }
}
