//! Shared block primitives for the node orchestrator.
//!
//! Full block and transaction parsing belongs to the daemon; the
//! orchestrator only needs enough structure to identify a block (the
//! 80-byte header and its hash) and to carry the transaction region as
//! opaque bytes between the daemon and the store.

pub mod block;
pub mod hash;
pub mod varint;

pub use block::{Block, BlockHeader, DecodeError};
pub use hash::{double_sha256, BlockHash};
