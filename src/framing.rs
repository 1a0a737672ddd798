//! 长度前缀帧：`[u32 大端长度][载荷比特]`。

use crate::bits::{pack, unpack};
use crate::constants::{BITS_PER_BYTE, LENGTH_HEADER_BITS};
use crate::error::{Result, StegoError};

/// 帧的总比特数：`32 + 8 * len`。
pub fn framed_len(payload_len: usize) -> usize {
    payload_len
        .saturating_mul(BITS_PER_BYTE)
        .saturating_add(LENGTH_HEADER_BITS)
}

/// 为载荷加上长度头并展开为比特序列。
///
/// # Errors
///
/// 载荷长度超过 `u32::MAX` 时返回 [`StegoError::PayloadTooLong`]。
pub fn frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| StegoError::PayloadTooLong { len: payload.len() })?;

    let mut bits = Vec::with_capacity(framed_len(payload.len()));
    bits.extend(pack(&len.to_be_bytes()));
    bits.extend(pack(payload));
    Ok(bits)
}

/// 读取长度头并取出其后的载荷，返回载荷与消耗的比特数。
///
/// # Errors
///
/// * 不足 32 位时返回 [`StegoError::HeaderTruncated`]。
/// * 声明长度超出剩余比特时返回 [`StegoError::PayloadTruncated`]。
pub fn unframe(bits: &[u8]) -> Result<(Vec<u8>, usize)> {
    let declared = read_header(bits)?;
    let rest = &bits[LENGTH_HEADER_BITS..];

    // 先与剩余容量比较再分配，避免被伪造的长度头拖入巨量分配
    if (declared as usize).saturating_mul(BITS_PER_BYTE) > rest.len() {
        return Err(StegoError::PayloadTruncated {
            declared,
            available: rest.len(),
        });
    }

    let payload = unpack(rest, declared as usize)?;
    Ok((payload, framed_len(declared as usize)))
}

/// 解析比特序列开头的 32 位大端长度。
pub fn read_header(bits: &[u8]) -> Result<u32> {
    if bits.len() < LENGTH_HEADER_BITS {
        return Err(StegoError::HeaderTruncated { have: bits.len() });
    }

    let header = unpack(&bits[..LENGTH_HEADER_BITS], 4)?;
    Ok(u32::from_be_bytes([header[0], header[1], header[2], header[3]]))
}
