//! Compact-size integers as used by the daemon's block serialization.

use crate::block::DecodeError;

/// Decode a compact-size integer, returning the value and the number of
/// bytes consumed.
pub fn read_varint(data: &[u8]) -> Result<(u64, usize), DecodeError> {
    let first = *data.first().ok_or(DecodeError::Truncated {
        needed: 1,
        have: 0,
    })?;
    match first {
        0xfd => {
            let bytes = take::<2>(&data[1..])?;
            Ok((u16::from_le_bytes(bytes) as u64, 3))
        }
        0xfe => {
            let bytes = take::<4>(&data[1..])?;
            Ok((u32::from_le_bytes(bytes) as u64, 5))
        }
        0xff => {
            let bytes = take::<8>(&data[1..])?;
            Ok((u64::from_le_bytes(bytes), 9))
        }
        value => Ok((value as u64, 1)),
    }
}

/// Encode a compact-size integer.
pub fn write_varint(value: u64, out: &mut Vec<u8>) {
    match value {
        0..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

fn take<const N: usize>(data: &[u8]) -> Result<[u8; N], DecodeError> {
    data.get(..N)
        .ok_or(DecodeError::Truncated {
            needed: N,
            have: data.len(),
        })?
        .try_into()
        .map_err(|_| DecodeError::Truncated {
            needed: N,
            have: data.len(),
        })
}
