//! # 错误类型模块
//!
//! 隐写编解码层的结构化错误。调用方可以据此区分 “载体损坏或不含数据”
//! 与 “成功提取到空载荷” 两种情况。

use thiserror::Error;

/// 编解码核心产生的错误。
#[derive(Debug, Error)]
pub enum StegoError {
    /// 比特数不足以组成请求的字节数。
    #[error("truncated input: need {need} bits, have {have}")]
    TruncatedInput { need: usize, have: usize },

    /// 可用比特少于 32 位长度头。
    #[error("length header truncated: need 32 bits, have {have}")]
    HeaderTruncated { have: usize },

    /// 长度头声明的载荷超出剩余比特。
    #[error("payload truncated: header declares {declared} bytes, only {available} bits remain")]
    PayloadTruncated { declared: u32, available: usize },

    /// 载荷连同长度头放不进载体图像。
    #[error("not enough space in the carrier: required {required} bits, available {available}")]
    CapacityExceeded { required: usize, available: usize },

    /// 载荷长度超过 32 位长度头的表示范围。
    #[error("payload of {len} bytes does not fit a 32-bit length header")]
    PayloadTooLong { len: usize },

    /// 输出格式不是本程序可写入的无损格式。
    #[error("output format {0:?} cannot carry hidden data; use a lossless format such as PNG or BMP")]
    LossyOutput(image::ImageFormat),

    /// 图像无法读取或解码。
    #[error("invalid carrier image: {0}")]
    InvalidCarrier(#[from] image::ImageError),

    /// 提取出的分片不是合法的 UTF-8 文本。
    #[error("decoded share is not valid UTF-8")]
    ShareNotUtf8(#[from] std::string::FromUtf8Error),
}

/// 编解码核心使用的 `Result` 别名。
pub type Result<T> = std::result::Result<T, StegoError>;
