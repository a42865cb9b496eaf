//! Daemon supervision.
//!
//! The external block-producing daemon is an opaque collaborator: it
//! validates blocks, runs the mempool and the P2P side, and this crate
//! only cares about its lifecycle and two queries (height, block
//! fetch). The [`DaemonDriver`] trait is that boundary; the
//! [`Supervisor`] owns a driver plus the normalized configuration and
//! reports lifecycle events to the orchestrator over a bounded channel.

pub mod config;
pub mod driver;
pub mod rpc;
pub mod supervisor;

pub use config::{load_daemon_config, ConfigError, ConfigValue, NodeConfig, DAEMON_CONFIG_FILE};
pub use driver::{BlockRef, DaemonDriver, DaemonError, DaemonInfo};
pub use rpc::RpcDriver;
pub use supervisor::{DaemonEvent, Supervisor};
