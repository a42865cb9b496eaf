use thiserror::Error;

use crate::genesis::{LIVENET_GENESIS_HASH, REGTEST_GENESIS_HASH, TESTNET_GENESIS_HASH};
use crate::params::NetworkParams;
use crate::{LIVENET, REGTEST, TESTNET};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown network {0:?}")]
pub struct UnknownNetwork(pub String);

/// Owned registry of named networks.
///
/// Seeded with the three built-ins; `register`/`unregister` give tests
/// push/pop semantics for synthetic networks. `resolve` is a pure
/// lookup with no side effects.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<NetworkParams>,
    default_name: String,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        NetworkRegistry {
            networks: vec![
                NetworkParams {
                    name: LIVENET.to_string(),
                    magic: [0xf9, 0xbe, 0xb4, 0xd9],
                    default_port: 8333,
                    rpc_port: 8332,
                    pubkey_hash_version: 0x00,
                    script_hash_version: 0x05,
                    genesis_hash: NetworkParams::known_hash(LIVENET_GENESIS_HASH),
                },
                NetworkParams {
                    name: TESTNET.to_string(),
                    magic: [0x0b, 0x11, 0x09, 0x07],
                    default_port: 18333,
                    rpc_port: 18332,
                    pubkey_hash_version: 0x6f,
                    script_hash_version: 0xc4,
                    genesis_hash: NetworkParams::known_hash(TESTNET_GENESIS_HASH),
                },
                NetworkParams {
                    name: REGTEST.to_string(),
                    magic: [0xfa, 0xbf, 0xb5, 0xda],
                    default_port: 18444,
                    rpc_port: 18443,
                    pubkey_hash_version: 0x6f,
                    script_hash_version: 0xc4,
                    genesis_hash: NetworkParams::known_hash(REGTEST_GENESIS_HASH),
                },
            ],
            default_name: LIVENET.to_string(),
        }
    }

    /// Look up parameters by selector; `None` yields the default network.
    pub fn resolve(&self, selector: Option<&str>) -> Result<&NetworkParams, UnknownNetwork> {
        let name = selector.unwrap_or(&self.default_name);
        self.networks
            .iter()
            .find(|params| params.name == name)
            .ok_or_else(|| UnknownNetwork(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.networks.iter().any(|params| params.name == name)
    }

    pub fn default_params(&self) -> &NetworkParams {
        self.resolve(None).expect("default network is always registered")
    }

    pub fn is_default(&self, name: &str) -> bool {
        name == self.default_name
    }

    /// Register a network, replacing any existing entry with the same name.
    pub fn register(&mut self, params: NetworkParams) {
        self.unregister(&params.name);
        self.networks.push(params);
    }

    /// Remove a network by name, returning its parameters if present.
    pub fn unregister(&mut self, name: &str) -> Option<NetworkParams> {
        let index = self.networks.iter().position(|params| params.name == name)?;
        Some(self.networks.remove(index))
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        NetworkRegistry::new()
    }
}
