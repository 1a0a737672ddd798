use image::RgbaImage;
use tracing::debug;

use crate::constants::{BITS_PER_BYTE, CHANNELS_PER_PIXEL, LENGTH_HEADER_BITS};
use crate::error::{Result, StegoError};
use crate::framing::{frame, framed_len, read_header, unframe};

/// 图像可承载的比特数：`width * height * 3`。
pub fn capacity(image: &RgbaImage) -> usize {
    (image.width() as usize)
        .saturating_mul(image.height() as usize)
        .saturating_mul(CHANNELS_PER_PIXEL)
}

/// 能放进该图像的最大载荷字节数。
pub fn max_payload_len(image: &RgbaImage) -> usize {
    capacity(image).saturating_sub(LENGTH_HEADER_BITS) / 8
}

/// 将载荷写入图像副本的 R, G, B 最低位，像素按行优先顺序。
///
/// Alpha 通道与帧之后的所有通道保持不变，输入图像不会被修改。
///
/// # Errors
///
/// 帧长度超过 [`capacity`] 时返回 [`StegoError::CapacityExceeded`]。
pub fn embed(image: &RgbaImage, payload: &[u8]) -> Result<RgbaImage> {
    let required = framed_len(payload.len());
    let available = capacity(image);
    if required > available {
        return Err(StegoError::CapacityExceeded {
            required,
            available,
        });
    }

    let bits = frame(payload)?;
    let mut out = image.clone();

    out.pixels_mut()
        .flat_map(|pixel| pixel.0.iter_mut().take(CHANNELS_PER_PIXEL))
        .zip(&bits)
        .for_each(|(channel, &bit)| *channel = (*channel & 0xFE) | bit);

    debug!(
        payload_len = payload.len(),
        bits = bits.len(),
        capacity = available,
        "payload embedded"
    );

    Ok(out)
}

/// 按行优先顺序逐个产出 R, G, B 通道的最低位，按需读取。
pub fn channel_lsbs(image: &RgbaImage) -> impl Iterator<Item = u8> + '_ {
    image
        .pixels()
        .flat_map(|pixel| pixel.0.into_iter().take(CHANNELS_PER_PIXEL))
        .map(|channel| channel & 1)
}

/// 从图像中提取载荷。
///
/// 总比特数不足 32 的极小图像视为不含载荷，返回空载荷而不是错误。
///
/// # Errors
///
/// 长度头声明的载荷超出图像容量时返回 [`StegoError::PayloadTruncated`]，
/// 通常意味着图像被损坏或从未写入数据。
pub fn extract(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut lsbs = channel_lsbs(image);
    let mut bits: Vec<u8> = lsbs.by_ref().take(LENGTH_HEADER_BITS).collect();
    if bits.len() < LENGTH_HEADER_BITS {
        debug!(bits = bits.len(), "carrier too small for a length header");
        return Ok(Vec::new());
    }

    // 只读取长度头声明的部分，超出容量的长度直接拒绝
    let declared = read_header(&bits)?;
    let available = capacity(image) - LENGTH_HEADER_BITS;
    let wanted = (declared as usize).saturating_mul(BITS_PER_BYTE);
    if wanted > available {
        return Err(StegoError::PayloadTruncated {
            declared,
            available,
        });
    }

    bits.reserve_exact(wanted);
    bits.extend(lsbs.take(wanted));
    let (payload, consumed) = unframe(&bits)?;
    debug!(payload_len = payload.len(), consumed, "payload extracted");
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::unpack;
    use image::Rgba;
    use proptest::prelude::*;

    fn gray(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 + y) as u8, (y * 13) as u8, 0xFF, 0x80])
        })
    }

    #[test]
    fn capacity_counts_three_channels_per_pixel() {
        assert_eq!(capacity(&gray(4, 4)), 48);
        assert_eq!(capacity(&gray(0, 10)), 0);
        assert_eq!(max_payload_len(&gray(4, 4)), 2);
    }

    #[test]
    fn single_byte_bit_order() {
        let img = embed(&gray(4, 4), &[0x01]).unwrap();
        let bits: Vec<u8> = channel_lsbs(&img).collect();
        assert_eq!(read_header(&bits).unwrap(), 1);
        assert_eq!(&bits[32..40], &[0u8, 0, 0, 0, 0, 0, 0, 1][..]);
        assert_eq!(unpack(&bits[32..40], 1).unwrap(), vec![0x01]);
    }

    #[test]
    fn ab_fits_exactly_in_48_bits() {
        let img = embed(&gray(4, 4), b"AB").unwrap();
        assert_eq!(read_header(&channel_lsbs(&img).collect::<Vec<_>>()).unwrap(), 2);
        assert_eq!(extract(&img).unwrap(), b"AB");
    }

    #[test]
    fn ab_rejected_below_48_bits() {
        // 47 个可用比特无法由整像素构成，这里用 45 (15 像素) 验证边界以下的拒绝
        let err = embed(&gray(5, 3), b"AB").unwrap_err();
        assert!(matches!(
            err,
            StegoError::CapacityExceeded {
                required: 48,
                available: 45
            }
        ));
    }

    #[test]
    fn alpha_and_unused_channels_untouched() {
        let original = gray(8, 8);
        let img = embed(&original, b"A").unwrap();
        for (i, (before, after)) in original.pixels().zip(img.pixels()).enumerate() {
            assert_eq!(before.0[3], after.0[3]);
            for c in 0..3 {
                assert_eq!(before.0[c] & 0xFE, after.0[c] & 0xFE);
                if i * 3 + c >= 40 {
                    assert_eq!(before.0[c], after.0[c]);
                }
            }
        }
    }

    #[test]
    fn tiny_image_yields_empty_payload() {
        assert!(extract(&gray(3, 3)).unwrap().is_empty());
        assert!(extract(&gray(0, 0)).unwrap().is_empty());
    }

    #[test]
    fn zero_length_payload_round_trips() {
        let img = embed(&gray(4, 4), &[]).unwrap();
        assert!(extract(&img).unwrap().is_empty());
    }

    #[test]
    fn foreign_image_reports_truncation() {
        let white = RgbaImage::from_pixel(8, 8, Rgba([0xFF, 0xFF, 0xFF, 0xFF]));
        let err = extract(&white).unwrap_err();
        assert!(matches!(
            err,
            StegoError::PayloadTruncated {
                declared: u32::MAX,
                available: 160
            }
        ));
    }

    #[test]
    fn header_one_byte_past_capacity_is_rejected() {
        // 4x4 载体容量 48 bit，最多 2 字节；伪造长度 3
        let stego = embed(&gray(4, 4), b"AB").unwrap();
        let mut forged = stego.clone();
        let header = crate::bits::pack(&3u32.to_be_bytes());
        forged
            .pixels_mut()
            .flat_map(|pixel| pixel.0.iter_mut().take(CHANNELS_PER_PIXEL))
            .zip(&header)
            .for_each(|(channel, &bit)| *channel = (*channel & 0xFE) | bit);

        let err = extract(&forged).unwrap_err();
        assert!(matches!(
            err,
            StegoError::PayloadTruncated {
                declared: 3,
                available: 16
            }
        ));
        assert_eq!(extract(&stego).unwrap(), b"AB");
    }

    #[test]
    fn lsbs_are_read_lazily_in_channel_order() {
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgba([1, 0, 1, 0]) } else { Rgba([0, 1, 1, 1]) }
        });
        let mut lsbs = channel_lsbs(&img);
        assert_eq!(lsbs.by_ref().take(4).collect::<Vec<_>>(), vec![1, 0, 1, 0]);
        assert_eq!(lsbs.collect::<Vec<_>>(), vec![1, 1]);
    }

    proptest! {
        #[test]
        fn extract_inverts_embed(
            payload in proptest::collection::vec(any::<u8>(), 0..64),
            width in 1u32..24,
            height in 1u32..24,
        ) {
            let img = gray(width, height);
            match embed(&img, &payload) {
                Ok(stego) => prop_assert_eq!(extract(&stego).unwrap(), payload),
                Err(StegoError::CapacityExceeded { required, available }) => {
                    prop_assert!(required > available);
                    prop_assert_eq!(required, 32 + 8 * payload.len());
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
    }
}
