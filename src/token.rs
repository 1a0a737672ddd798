//! # 令牌拆分与合并
//!
//! 一个秘密令牌被拆成两段，分别隐藏在两张图像中。合并时按固定顺序直接拼接：
//! 图像 1 的分片在前，图像 2 的分片在后，没有分隔符，也没有校验和。
//! 顺序错误会得到另一个通常无效的令牌，有效性由服务端判定。

use std::fmt;

use image::RgbaImage;

use crate::error::Result;
use crate::steganography::{embed, extract};

/// 分片所属的图像槽位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// 图像 1，承载令牌的前半段。
    First,
    /// 图像 2，承载令牌的后半段。
    Second,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::First => f.write_str("image 1"),
            Slot::Second => f.write_str("image 2"),
        }
    }
}

/// 在字符中点拆分令牌，前一段取 `ceil(n / 2)` 个字符。
pub fn split(token: &str) -> (String, String) {
    let chars = token.chars().count();
    split_at(token, chars.div_ceil(2))
}

/// 在第 `index` 个字符处拆分令牌，超出长度时后一段为空。
///
/// 拆分点总在字符边界上，不会截断 UTF-8 编码。
pub fn split_at(token: &str, index: usize) -> (String, String) {
    let byte_index = token
        .char_indices()
        .nth(index)
        .map_or(token.len(), |(i, _)| i);
    let (a, b) = token.split_at(byte_index);
    (a.to_owned(), b.to_owned())
}

/// 按 “图像 1 在前、图像 2 在后” 拼接两个分片。
pub fn join(share_a: &str, share_b: &str) -> String {
    let mut token = String::with_capacity(share_a.len() + share_b.len());
    token.push_str(share_a);
    token.push_str(share_b);
    token
}

/// 将一个分片写入载体图像。
///
/// # Errors
///
/// 载体容量不足时返回 [`StegoError::CapacityExceeded`](crate::error::StegoError::CapacityExceeded)。
pub fn embed_share(image: &RgbaImage, share: &str) -> Result<RgbaImage> {
    embed(image, share.as_bytes())
}

/// 从载体图像中提取分片文本。
///
/// # Errors
///
/// 帧损坏时返回截断错误；内容不是 UTF-8 时返回
/// [`StegoError::ShareNotUtf8`](crate::error::StegoError::ShareNotUtf8)。
pub fn decode_share(image: &RgbaImage) -> Result<String> {
    Ok(String::from_utf8(extract(image)?)?)
}
