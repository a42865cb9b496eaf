//! Network parameter registry.
//!
//! Maps a network selector (`livenet`, `testnet`, `regtest`) to the
//! immutable parameters the rest of the node keys off: message-start
//! magic, ports, address versions, and the known genesis hash. The
//! registry is an owned value rather than process-wide state so tests
//! can register and remove synthetic networks without touching globals.

pub mod genesis;
pub mod params;
pub mod registry;

pub use genesis::{genesis_block, genesis_coinbase, GENESIS_MERKLE_ROOT};
pub use params::NetworkParams;
pub use registry::{NetworkRegistry, UnknownNetwork};

/// Selector name of the default network.
pub const LIVENET: &str = "livenet";
pub const TESTNET: &str = "testnet";
pub const REGTEST: &str = "regtest";
