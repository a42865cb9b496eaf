use pretty_assertions::assert_eq;
use primitives::{Block, BlockHash};
use rstest::rstest;

use networks::genesis::{
    genesis_coinbase_txid, LIVENET_GENESIS_HASH, REGTEST_GENESIS_HASH, TESTNET_GENESIS_HASH,
};
use networks::{genesis_block, NetworkParams, NetworkRegistry, GENESIS_MERKLE_ROOT};

#[rstest]
#[case("livenet", [0xf9, 0xbe, 0xb4, 0xd9], 8333, 8332, LIVENET_GENESIS_HASH)]
#[case("testnet", [0x0b, 0x11, 0x09, 0x07], 18333, 18332, TESTNET_GENESIS_HASH)]
#[case("regtest", [0xfa, 0xbf, 0xb5, 0xda], 18444, 18443, REGTEST_GENESIS_HASH)]
fn resolve_returns_known_constants(
    #[case] name: &str,
    #[case] magic: [u8; 4],
    #[case] port: u16,
    #[case] rpc_port: u16,
    #[case] genesis_hash: &str,
) {
    let registry = NetworkRegistry::new();
    let params = registry.resolve(Some(name)).unwrap();
    assert_eq!(params.magic, magic);
    assert_eq!(params.default_port, port);
    assert_eq!(params.rpc_port, rpc_port);
    assert_eq!(params.genesis_hash, genesis_hash.parse::<BlockHash>().unwrap());
}

#[test]
fn absent_selector_resolves_to_livenet() {
    let registry = NetworkRegistry::new();
    assert_eq!(registry.resolve(None).unwrap().name, "livenet");
    assert!(registry.is_default("livenet"));
}

#[test]
fn unregistered_selector_fails() {
    let registry = NetworkRegistry::new();
    let err = registry.resolve(Some("simnet")).unwrap_err();
    assert_eq!(err.0, "simnet");
}

#[rstest]
#[case("livenet")]
#[case("testnet")]
#[case("regtest")]
fn builtin_genesis_reproduces_registered_hash(#[case] name: &str) {
    let registry = NetworkRegistry::new();
    let params = registry.resolve(Some(name)).unwrap();
    let genesis = genesis_block(name).unwrap();
    assert_eq!(genesis.hash(), params.genesis_hash);
}

#[test]
fn genesis_coinbase_txid_is_the_merkle_root() {
    assert_eq!(
        genesis_coinbase_txid(),
        GENESIS_MERKLE_ROOT.parse::<BlockHash>().unwrap()
    );
}

#[test]
fn genesis_block_survives_its_own_codec() {
    let genesis = genesis_block("livenet").unwrap();
    let decoded = Block::decode(&genesis.encode()).unwrap();
    assert_eq!(decoded.hash(), genesis.hash());
    assert_eq!(decoded.tx_count, 1);
}

#[test]
fn synthetic_network_can_be_registered_and_removed() {
    let mut registry = NetworkRegistry::new();
    let params = NetworkParams {
        name: "simnet".to_string(),
        magic: [0x16, 0x1c, 0x14, 0x12],
        default_port: 18555,
        rpc_port: 18556,
        pubkey_hash_version: 0x3f,
        script_hash_version: 0x7b,
        genesis_hash: BlockHash::ZERO,
    };
    registry.register(params.clone());
    assert_eq!(registry.resolve(Some("simnet")).unwrap(), &params);

    let removed = registry.unregister("simnet").unwrap();
    assert_eq!(removed, params);
    assert!(registry.resolve(Some("simnet")).is_err());
    // Built-ins are untouched.
    assert!(registry.contains("testnet"));
}
