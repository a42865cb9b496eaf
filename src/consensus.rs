use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use chain::{ChainEvent, ChainState};
use networks::{genesis_block, NetworkParams, NetworkRegistry};
use primitives::Block;

use crate::error::NodeError;

/// Resolves the network selector and seeds the chain-state with its
/// genesis block.
///
/// A hex-encoded genesis override replaces the built-in block and is
/// only checked structurally; without an override the built-in block
/// must reproduce the hash the registry carries for the network, so a
/// constant drift cannot slip through.
pub fn resolve_consensus(
    registry: &NetworkRegistry,
    selector: Option<&str>,
    genesis_override: Option<&str>,
) -> Result<(NetworkParams, Arc<ChainState>, mpsc::Receiver<ChainEvent>), NodeError> {
    let params = registry.resolve(selector)?.clone();

    let genesis = match genesis_override {
        Some(hex) => decode_genesis_override(hex)?,
        None => {
            let block = genesis_block(&params.name).ok_or_else(|| {
                NodeError::InvalidGenesis(format!(
                    "network {} has no built-in genesis; supply one explicitly",
                    params.name
                ))
            })?;
            let hash = block.hash();
            if hash != params.genesis_hash {
                return Err(NodeError::InvalidGenesis(format!(
                    "built-in genesis hashes to {hash}, registry expects {}",
                    params.genesis_hash
                )));
            }
            block
        }
    };

    info!(network = %params.name, genesis = %genesis.hash(), "consensus resolved");
    let (chain, chain_events) = ChainState::new(genesis);
    Ok((params, Arc::new(chain), chain_events))
}

fn decode_genesis_override(hex: &str) -> Result<Block, NodeError> {
    let raw = hex::decode(hex.trim())
        .map_err(|err| NodeError::InvalidGenesis(format!("genesis is not hex: {err}")))?;
    Block::decode(&raw).map_err(|err| NodeError::InvalidGenesis(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use networks::{LIVENET, REGTEST, TESTNET};

    #[test]
    fn builtin_genesis_resolves_for_every_network() {
        let registry = NetworkRegistry::new();
        for name in [LIVENET, TESTNET, REGTEST] {
            let (params, chain, _events) =
                resolve_consensus(&registry, Some(name), None).expect("resolve");
            assert_eq!(chain.genesis_hash(), params.genesis_hash);
            assert_eq!(chain.tip().height, 0);
        }
    }

    #[test]
    fn unknown_selector_is_rejected() {
        let registry = NetworkRegistry::new();
        let err = resolve_consensus(&registry, Some("simnet"), None).expect_err("must fail");
        assert!(matches!(err, NodeError::UnknownNetwork(_)));
    }

    #[test]
    fn genesis_override_replaces_the_builtin_block() {
        let registry = NetworkRegistry::new();
        let block = genesis_block(REGTEST).expect("regtest genesis");
        let hex = hex::encode(block.encode());

        // An override is taken as-is even on another network.
        let (_params, chain, _events) =
            resolve_consensus(&registry, Some(LIVENET), Some(&hex)).expect("resolve");
        assert_eq!(chain.genesis_hash(), block.hash());
    }

    #[test]
    fn malformed_override_is_invalid_genesis() {
        let registry = NetworkRegistry::new();
        for bad in ["zzzz", "00112233"] {
            let err = resolve_consensus(&registry, None, Some(bad)).expect_err("must fail");
            assert!(matches!(err, NodeError::InvalidGenesis(_)));
        }
    }
}
