use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::block::DecodeError;

/// Double-SHA256 over arbitrary bytes.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// A block hash in internal (little-endian) byte order.
///
/// Displayed and parsed in the conventional reversed hex form, so
/// `BlockHash::from_str("000000000019d668...")` holds the bytes the wire
/// format uses while printing the way explorers do.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub const ZERO: BlockHash = BlockHash([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }
}

impl FromStr for BlockHash {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s).map_err(|_| DecodeError::BadHex)?;
        let mut bytes: [u8; 32] = raw.try_into().map_err(|_| DecodeError::BadHex)?;
        bytes.reverse();
        Ok(BlockHash(bytes))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}
