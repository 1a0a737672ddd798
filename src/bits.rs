//! 字节与比特序列之间的转换，字节内按最高位优先展开。

use crate::constants::BITS_PER_BYTE;
use crate::error::{Result, StegoError};

/// 逐个产出一个字节的比特，最高位在前。
#[derive(Debug, Clone)]
pub struct MsbFirst {
    byte: u8,
    offset: usize,
}

impl From<u8> for MsbFirst {
    fn from(value: u8) -> Self {
        Self {
            byte: value,
            offset: 0,
        }
    }
}

impl Iterator for MsbFirst {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset == BITS_PER_BYTE {
            return None;
        }

        let bit = (self.byte >> (BITS_PER_BYTE - 1 - self.offset)) & 1;
        self.offset += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = BITS_PER_BYTE - self.offset;
        (left, Some(left))
    }
}

impl ExactSizeIterator for MsbFirst {}

/// 将载荷展开为比特序列，输出长度恰为 `8 * payload.len()`。
pub fn pack(payload: &[u8]) -> Vec<u8> {
    payload.iter().copied().flat_map(MsbFirst::from).collect()
}

/// 从比特序列开头取 `8 * byte_count` 个比特，按最高位优先重组为字节。
///
/// # Errors
///
/// 比特数不足时返回 [`StegoError::TruncatedInput`]。
pub fn unpack(bits: &[u8], byte_count: usize) -> Result<Vec<u8>> {
    let need = byte_count
        .checked_mul(BITS_PER_BYTE)
        .ok_or(StegoError::TruncatedInput {
            need: usize::MAX,
            have: bits.len(),
        })?;

    if bits.len() < need {
        return Err(StegoError::TruncatedInput {
            need,
            have: bits.len(),
        });
    }

    Ok(bits[..need]
        .chunks_exact(BITS_PER_BYTE)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | (bit & 1)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_first_order() {
        assert_eq!(pack(&[0x01]), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(pack(&[0x80]), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(pack(&[0xA5]), vec![1, 0, 1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn pack_length_is_eight_times_input() {
        assert!(pack(&[]).is_empty());
        assert_eq!(pack(b"hello").len(), 40);
    }

    #[test]
    fn unpack_reads_only_requested_bytes() {
        let mut bits = pack(b"AB");
        bits.extend([1, 1, 1]);
        assert_eq!(unpack(&bits, 1).unwrap(), b"A");
        assert_eq!(unpack(&bits, 2).unwrap(), b"AB");
        assert!(unpack(&bits, 0).unwrap().is_empty());
    }

    #[test]
    fn unpack_rejects_short_input() {
        let bits = pack(b"A");
        let err = unpack(&bits[..7], 1).unwrap_err();
        assert!(matches!(err, StegoError::TruncatedInput { need: 8, have: 7 }));
    }
}
