//! # 命令处理逻辑模块
//!
//! 包含处理各子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用核心隐写算法以及向用户报告结果。

use crate::cli::{CombineArgs, HideArgs, RecoverArgs, SplitArgs};
use crate::constants::{
    DEFAULT_IMAGE_EXTENSION, DEFAULT_TEXT_EXTENSION, DOCTORED_PREFIX, RECOVERED_PREFIX,
};
use crate::framing::framed_len;
use crate::image_io::{load_carrier, output_format, save_carrier};
use crate::session::Reconstruction;
use crate::steganography::{capacity, embed, extract, max_payload_len};
use crate::token::{Slot, embed_share, split, split_at};
use anyhow::{Context, Result};
use colored::Colorize;
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 由输入文件路径生成默认输出路径：`<dir>/<prefix><stem><suffix>.<ext>`。
pub fn default_output_path(input: &Path, prefix: &str, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{prefix}{stem}{suffix}.{extension}"))
}

/// 目标文件已存在且未指定 `--force` 时拒绝写入。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 在读取任何输入之前确认输出路径是可写入的无损格式。
fn ensure_lossless_output(path: &Path) -> Result<()> {
    output_format(path).with_context(|| {
        format!(
            "Unsupported output image: {}",
            path.to_string_lossy().red().bold()
        )
    })?;
    Ok(())
}

fn read_carrier(path: &Path) -> Result<RgbaImage> {
    load_carrier(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })
}

fn write_carrier(image: &RgbaImage, path: &Path) -> Result<()> {
    save_carrier(image, path).with_context(|| {
        format!(
            "Unable to write to target image file: {} \nUse a lossless format such as PNG or BMP.",
            path.to_string_lossy().red().bold()
        )
    })
}

/// 检查载荷能否放进载体，给出面向用户的提示。
fn ensure_capacity(picture: &RgbaImage, payload_len: usize, path: &Path) -> Result<()> {
    let required = framed_len(payload_len);
    let available = capacity(picture);
    debug!(required, available, "capacity check");

    anyhow::ensure!(
        available >= required,
        "Not enough space in the image {} to hide the text. \nRequired: {} bits, Available: {} bits (at most {} bytes)",
        path.to_string_lossy().red().bold(),
        required.to_string().red().bold(),
        available.to_string().green().bold(),
        max_payload_len(picture).to_string().green().bold()
    );
    Ok(())
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取图像和内容文件、检查隐写空间是否足够、调用隐写核心函数写入长度头与内容，
/// 最后将结果写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像或内容文件。
/// * 图像没有足够的空间来隐藏内容。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法写入到目标图像文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args.dest.unwrap_or_else(|| {
        default_output_path(&args.image, DOCTORED_PREFIX, "", DEFAULT_IMAGE_EXTENSION)
    });
    ensure_writable(&dest, args.force)?;
    ensure_lossless_output(&dest)?;

    let picture = read_carrier(&args.image)?;

    let text = fs::read(&args.text).with_context(|| {
        format!(
            "Unable to read text file: {}",
            args.text.to_string_lossy().red().bold()
        )
    })?;

    ensure_capacity(&picture, text.len(), &args.image)?;

    let doctored = embed(&picture, &text).with_context(|| {
        "Failed to hide the message in the image. \nThe image may be corrupt."
    })?;

    write_carrier(&doctored, &dest)?;
    info!(dest = %dest.display(), bytes = text.len(), "payload hidden");

    println!(
        "The text has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像文件、调用恢复核心函数取出内容，
/// 最后将恢复的内容写入目标文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件。
/// * 图像不含隐藏数据或已损坏。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法写入到目标文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let dest = args.text.unwrap_or_else(|| {
        default_output_path(&args.image, RECOVERED_PREFIX, "", DEFAULT_TEXT_EXTENSION)
    });
    ensure_writable(&dest, args.force)?;

    let picture = read_carrier(&args.image)?;

    let text = extract(&picture).with_context(|| {
        format!(
            "Failed to recover the message from '{}'. \nThe image may not contain a hidden message or is corrupted.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    fs::write(&dest, &text).with_context(|| {
        format!(
            "Unable to write to target text file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;
    info!(dest = %dest.display(), bytes = text.len(), "payload recovered");

    println!(
        "The text has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Split' 命令的执行逻辑。
///
/// 拆分令牌后，前半段写入图像 1，后半段写入图像 2。两张图像应通过不同渠道投递。
///
/// # Errors
///
/// 令牌为空、任一载体容量不足、目标文件已存在或读写失败时返回错误。
pub fn handle_split(args: SplitArgs) -> Result<()> {
    anyhow::ensure!(!args.token.is_empty(), "The token to split is empty.");

    let (share_a, share_b) = match args.at {
        Some(index) => split_at(&args.token, index),
        None => split(&args.token),
    };
    debug!(first = share_a.len(), second = share_b.len(), "token split");

    let jobs = [
        (Slot::First, &args.first, args.first_dest, share_a, "_1"),
        (Slot::Second, &args.second, args.second_dest, share_b, "_2"),
    ]
    .map(|(slot, cover, dest, share, suffix)| {
        let dest = dest.unwrap_or_else(|| {
            default_output_path(cover, DOCTORED_PREFIX, suffix, DEFAULT_IMAGE_EXTENSION)
        });
        (slot, cover, dest, share)
    });

    // 两张载体都通过检查后才写入，避免只留下一半的结果
    let mut pictures = Vec::with_capacity(jobs.len());
    for (_, cover, dest, share) in &jobs {
        ensure_writable(dest, args.force)?;
        ensure_lossless_output(dest)?;
        let picture = read_carrier(cover)?;
        ensure_capacity(&picture, share.len(), cover)?;
        pictures.push(picture);
    }

    for ((slot, _, dest, share), picture) in jobs.iter().zip(&pictures) {
        let doctored = embed_share(picture, share)
            .with_context(|| format!("Failed to hide the share for {slot}."))?;
        write_carrier(&doctored, dest)?;
        info!(%slot, dest = %dest.display(), "share hidden");

        println!(
            "The share for {} has been hidden and saved: {}",
            slot.to_string().bold(),
            dest.to_string_lossy().green().bold()
        );
    }

    Ok(())
}

/// 处理 'Combine' 命令的执行逻辑。
///
/// 依次解码图像 1 与图像 2 的分片，按固定顺序拼接出令牌。
/// 两张图像的顺序不可交换，否则得到的令牌无效。
///
/// # Errors
///
/// 任一图像无法读取、不含分片，或输出失败时返回错误。
pub fn handle_combine(args: CombineArgs) -> Result<()> {
    if let Some(out) = &args.out {
        ensure_writable(out, args.force)?;
    }

    let mut session = Reconstruction::new();
    for (slot, path) in [(Slot::First, &args.first), (Slot::Second, &args.second)] {
        let picture = read_carrier(path)?;
        session.load_image(slot, &picture).with_context(|| {
            format!(
                "Failed to extract the share from '{}'. \nThe image may not contain a hidden share or is corrupted.",
                path.to_string_lossy().red().bold()
            )
        })?;
    }

    let token = session.join()?.to_owned();

    match &args.out {
        Some(out) => {
            fs::write(out, &token).with_context(|| {
                format!(
                    "Unable to write to target token file: {}",
                    out.to_string_lossy().red().bold()
                )
            })?;
            println!(
                "The token has been successfully reconstructed and saved: {}",
                out.to_string_lossy().green().bold()
            );
        }
        None => println!("{token}"),
    }

    Ok(())
}
