//! Block and metadata persistence.
//!
//! The store owns the on-disk database directory for the bound
//! network: raw block files under `blocks/` plus a JSON metadata
//! document carrying the chain tip. It sits between the daemon (block
//! source) and the chain-state (tip authority): a block is written
//! durably first and only then surfaced as the new tip.

mod paths;
mod store;

pub use paths::{database_path, DB_NAME};
pub use store::{bind_database, BlockDecoder, Store, StoreError, StoreEvent};
