//! Built-in genesis blocks.
//!
//! Each network's genesis is reconstructed from its known header fields
//! plus the shared coinbase transaction, and must hash to the registered
//! genesis hash exactly. A wrong genesis silently forks the node from
//! its peers, so both sides of that equation are kept as constants and
//! cross-checked in tests.

use primitives::{double_sha256, Block, BlockHash, BlockHeader};

use crate::{LIVENET, REGTEST, TESTNET};

pub const LIVENET_GENESIS_HASH: &str =
    "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
pub const TESTNET_GENESIS_HASH: &str =
    "000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943";
pub const REGTEST_GENESIS_HASH: &str =
    "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206";

/// Merkle root shared by all three built-in networks (the genesis block
/// holds a single coinbase, so this is also its txid).
pub const GENESIS_MERKLE_ROOT: &str =
    "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

const GENESIS_TIMESTAMP: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";
const GENESIS_PUBKEY_HEX: &str =
    "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";
const OP_CHECKSIG: u8 = 0xac;
const GENESIS_REWARD: u64 = 50 * 100_000_000;
const GENESIS_SCRIPT_BITS: u32 = 0x1d00ffff;

/// Header fields that differ per network.
struct GenesisFields {
    time: u32,
    bits: u32,
    nonce: u32,
}

fn fields(network: &str) -> Option<GenesisFields> {
    match network {
        LIVENET => Some(GenesisFields {
            time: 1_231_006_505,
            bits: 0x1d00ffff,
            nonce: 2_083_236_893,
        }),
        TESTNET => Some(GenesisFields {
            time: 1_296_688_602,
            bits: 0x1d00ffff,
            nonce: 414_098_458,
        }),
        REGTEST => Some(GenesisFields {
            time: 1_296_688_602,
            bits: 0x207fffff,
            nonce: 2,
        }),
        _ => None,
    }
}

/// Serialize the genesis coinbase transaction.
pub fn genesis_coinbase() -> Vec<u8> {
    let message = GENESIS_TIMESTAMP.as_bytes();
    let pubkey = hex::decode(GENESIS_PUBKEY_HEX).expect("genesis pubkey constant");

    let mut script_sig = Vec::with_capacity(5 + 2 + 1 + message.len());
    script_sig.push(4);
    script_sig.extend_from_slice(&GENESIS_SCRIPT_BITS.to_le_bytes());
    script_sig.extend_from_slice(&[1, 4]);
    script_sig.push(message.len() as u8);
    script_sig.extend_from_slice(message);

    // push65 <pubkey> OP_CHECKSIG
    let mut script_pubkey = Vec::with_capacity(2 + pubkey.len());
    script_pubkey.push(pubkey.len() as u8);
    script_pubkey.extend_from_slice(&pubkey);
    script_pubkey.push(OP_CHECKSIG);

    let mut tx = Vec::new();
    tx.extend_from_slice(&1u32.to_le_bytes()); // version
    tx.push(1); // input count
    tx.extend_from_slice(&[0u8; 32]); // null prevout
    tx.extend_from_slice(&u32::MAX.to_le_bytes());
    tx.push(script_sig.len() as u8);
    tx.extend_from_slice(&script_sig);
    tx.extend_from_slice(&u32::MAX.to_le_bytes()); // sequence
    tx.push(1); // output count
    tx.extend_from_slice(&GENESIS_REWARD.to_le_bytes());
    tx.push(script_pubkey.len() as u8);
    tx.extend_from_slice(&script_pubkey);
    tx.extend_from_slice(&0u32.to_le_bytes()); // locktime
    tx
}

/// Build the genesis block for a built-in network; `None` for networks
/// registered without a built-in genesis (those require an explicit
/// genesis override at consensus resolution).
pub fn genesis_block(network: &str) -> Option<Block> {
    let fields = fields(network)?;
    let merkle_root: BlockHash = GENESIS_MERKLE_ROOT.parse().expect("genesis merkle constant");
    let header = BlockHeader {
        version: 1,
        prev_block: BlockHash::ZERO,
        merkle_root: merkle_root.0,
        time: fields.time,
        bits: fields.bits,
        nonce: fields.nonce,
    };
    Some(Block {
        header,
        tx_count: 1,
        raw_txs: genesis_coinbase(),
    })
}

/// Txid of the genesis coinbase.
pub fn genesis_coinbase_txid() -> BlockHash {
    BlockHash(double_sha256(&genesis_coinbase()))
}
