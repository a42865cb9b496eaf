use thiserror::Error;

use crate::hash::{double_sha256, BlockHash};
use crate::varint::{read_varint, write_varint};

/// Serialized header size on the wire.
pub const HEADER_SIZE: usize = 80;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated input: needed {needed} more bytes, have {have}")]
    Truncated { needed: usize, have: usize },
    #[error("block carries no transactions")]
    EmptyTransactions,
    #[error("transaction region shorter than declared count")]
    TruncatedTransactions,
    #[error("invalid hex string")]
    BadHex,
}

/// The fixed 80-byte block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block: BlockHash,
    pub merkle_root: [u8; 32],
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(self.prev_block.as_bytes());
        out[36..68].copy_from_slice(&self.merkle_root);
        out[68..72].copy_from_slice(&self.time.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated {
                needed: HEADER_SIZE - data.len(),
                have: data.len(),
            });
        }
        let le32 = |range: std::ops::Range<usize>| -> [u8; 4] {
            data[range].try_into().expect("range is four bytes")
        };
        let mut prev_block = [0u8; 32];
        prev_block.copy_from_slice(&data[4..36]);
        let mut merkle_root = [0u8; 32];
        merkle_root.copy_from_slice(&data[36..68]);
        Ok(BlockHeader {
            version: i32::from_le_bytes(le32(0..4)),
            prev_block: BlockHash(prev_block),
            merkle_root,
            time: u32::from_le_bytes(le32(68..72)),
            bits: u32::from_le_bytes(le32(72..76)),
            nonce: u32::from_le_bytes(le32(76..80)),
        })
    }

    /// The block identity: double-SHA256 of the serialized header.
    pub fn hash(&self) -> BlockHash {
        BlockHash(double_sha256(&self.encode()))
    }
}

/// A block with a decoded header and an opaque transaction region.
///
/// Transaction structure is the daemon's business; the orchestrator only
/// checks that the declared count is present and carries the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub tx_count: u64,
    pub raw_txs: Vec<u8>,
}

impl Block {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let header = BlockHeader::decode(data)?;
        let rest = &data[HEADER_SIZE..];
        let (tx_count, consumed) = read_varint(rest)?;
        if tx_count == 0 {
            return Err(DecodeError::EmptyTransactions);
        }
        let raw_txs = rest[consumed..].to_vec();
        if raw_txs.is_empty() {
            return Err(DecodeError::TruncatedTransactions);
        }
        Ok(Block {
            header,
            tx_count,
            raw_txs,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + 9 + self.raw_txs.len());
        out.extend_from_slice(&self.header.encode());
        write_varint(self.tx_count, &mut out);
        out.extend_from_slice(&self.raw_txs);
        out
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_header() -> BlockHeader {
        BlockHeader {
            version: 1,
            prev_block: BlockHash::ZERO,
            merkle_root: [0xab; 32],
            time: 1_231_006_505,
            bits: 0x1d00ffff,
            nonce: 2_083_236_893,
        }
    }

    #[test]
    fn header_round_trip() {
        let header = sample_header();
        let decoded = BlockHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn header_hash_is_stable_across_round_trip() {
        let header = sample_header();
        let decoded = BlockHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded.hash(), header.hash());
    }

    #[test]
    fn block_round_trip() {
        let block = Block {
            header: sample_header(),
            tx_count: 1,
            raw_txs: vec![0x01, 0x02, 0x03],
        };
        let decoded = Block::decode(&block.encode()).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn short_input_is_truncated_error() {
        let err = Block::decode(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn zero_transactions_rejected() {
        let mut bytes = sample_header().encode().to_vec();
        bytes.push(0x00);
        assert_eq!(Block::decode(&bytes).unwrap_err(), DecodeError::EmptyTransactions);
    }

    #[test]
    fn missing_transaction_bytes_rejected() {
        let mut bytes = sample_header().encode().to_vec();
        bytes.push(0x01);
        assert_eq!(
            Block::decode(&bytes).unwrap_err(),
            DecodeError::TruncatedTransactions
        );
    }
}
