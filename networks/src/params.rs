use primitives::BlockHash;

/// Immutable parameters of one named network.
///
/// Defined once at registry construction and never mutated; components
/// that need them hold a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParams {
    pub name: String,
    /// Message-start bytes on the daemon's P2P wire.
    pub magic: [u8; 4],
    /// Default P2P listen port.
    pub default_port: u16,
    /// Default daemon RPC port, merged into the node configuration when
    /// the config file does not pin one.
    pub rpc_port: u16,
    pub pubkey_hash_version: u8,
    pub script_hash_version: u8,
    /// The hash the network's genesis block must reproduce exactly.
    pub genesis_hash: BlockHash,
}

impl NetworkParams {
    pub(crate) fn known_hash(hex: &str) -> BlockHash {
        hex.parse().expect("known genesis hash constant")
    }
}
