//! # 图像读写适配模块
//!
//! 将文件或内存中的图像解码为统一的 RGBA8 像素网格，供隐写核心使用；
//! 并把结果写回无损格式。实际的解压缩交给 `image` 库完成。

use std::io::Cursor;
use std::path::Path;

use image::{ImageError, ImageFormat, ImageReader, RgbaImage};
use tracing::debug;

use crate::error::{Result, StegoError};

/// 从文件加载载体图像，格式由文件内容推断。
///
/// # Errors
///
/// 文件无法读取或无法解码时返回 [`StegoError::InvalidCarrier`](crate::error::StegoError::InvalidCarrier)。
pub fn load_carrier(path: &Path) -> Result<RgbaImage> {
    let image = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(ImageError::IoError)?
        .decode()?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "carrier loaded");
    Ok(image.to_rgba8())
}

/// 从内存字节加载载体图像。
///
/// # Errors
///
/// 字节无法识别或解码时返回 [`StegoError::InvalidCarrier`](crate::error::StegoError::InvalidCarrier)。
pub fn load_carrier_from_bytes(bytes: &[u8]) -> Result<RgbaImage> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .decode()?;
    Ok(image.to_rgba8())
}

/// 可以保存隐写结果的无损格式。
const LOSSLESS_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
    ImageFormat::Qoi,
];

/// 由输出路径的扩展名确定图像格式，只接受已启用编码器的无损格式。
///
/// 不会触碰文件系统，可在写入任何文件之前调用。
///
/// # Errors
///
/// 扩展名无法识别时返回 [`StegoError::InvalidCarrier`](crate::error::StegoError::InvalidCarrier)；
/// 格式有损或未启用时返回 [`StegoError::LossyOutput`]。
pub fn output_format(path: &Path) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(path)?;
    if !LOSSLESS_FORMATS.contains(&format) || !format.writing_enabled() {
        return Err(StegoError::LossyOutput(format));
    }
    Ok(format)
}

/// 将图像保存到指定路径，格式由扩展名决定。
///
/// 只接受无损格式，有损格式会破坏最低位中的数据。
///
/// # Errors
///
/// 扩展名无法识别、格式有损或写入失败时返回错误。
pub fn save_carrier(image: &RgbaImage, path: &Path) -> Result<()> {
    let format = output_format(path)?;
    image.save_with_format(path, format)?;
    debug!(path = %path.display(), ?format, "carrier saved");
    Ok(())
}

/// 将图像编码为 PNG 字节，便于以附件形式投递。
///
/// # Errors
///
/// PNG 编码失败时返回错误。
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steganography::{embed, extract};
    use image::Rgba;

    #[test]
    fn png_bytes_preserve_embedded_payload() {
        let cover = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 255]));
        let stego = embed(&cover, b"share").unwrap();
        let bytes = encode_png(&stego).unwrap();
        let loaded = load_carrier_from_bytes(&bytes).unwrap();
        assert_eq!(extract(&loaded).unwrap(), b"share");
    }

    #[test]
    fn garbage_bytes_are_an_invalid_carrier() {
        let err = load_carrier_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, StegoError::InvalidCarrier(_)));
    }

    #[test]
    fn only_lossless_outputs_are_accepted() {
        assert_eq!(output_format(Path::new("a.png")).unwrap(), ImageFormat::Png);
        assert_eq!(output_format(Path::new("b.BMP")).unwrap(), ImageFormat::Bmp);
        assert!(matches!(
            output_format(Path::new("c.jpg")).unwrap_err(),
            StegoError::LossyOutput(ImageFormat::Jpeg)
        ));
        assert!(matches!(
            output_format(Path::new("d.unknown")).unwrap_err(),
            StegoError::InvalidCarrier(_)
        ));
    }

    #[test]
    fn missing_file_is_an_invalid_carrier() {
        let err = load_carrier(Path::new("/nonexistent/carrier.png")).unwrap_err();
        assert!(matches!(err, StegoError::InvalidCarrier(_)));
    }
}
