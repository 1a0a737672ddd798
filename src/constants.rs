/// 长度头占用的比特数。
/// 载荷长度以 `u32` 大端序写入，每个颜色通道的最低位存储 1 bit，
/// 因此需要 32 个颜色通道来隐藏长度。
pub const LENGTH_HEADER_BITS: usize = 32;

/// 每个像素中参与隐写的颜色通道数 (R, G, B)，Alpha 通道始终跳过。
pub const CHANNELS_PER_PIXEL: usize = 3;

/// 每个字节展开后的比特数。
pub const BITS_PER_BYTE: usize = 8;

/// 未指定输出路径时，隐写结果图像文件名的前缀。
pub const DOCTORED_PREFIX: &str = "doctored_";

/// 未指定输出路径时，恢复出的文本文件名的前缀。
pub const RECOVERED_PREFIX: &str = "recovered_";

/// 默认输出的图像扩展名，必须是无损格式。
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// 默认输出的文本扩展名。
pub const DEFAULT_TEXT_EXTENSION: &str = "txt";
