//! Orchestrates an external block daemon, a block store and the chain
//! tip into one node lifecycle.

pub mod consensus;
pub mod error;
pub mod node;
pub mod sync;

pub use consensus::resolve_consensus;
pub use error::NodeError;
pub use node::{DriverFactory, Node, NodeEvent, NodeHandle, NodeSettings, NodeState};
pub use sync::{SyncCursor, SyncEngine, SyncState};
