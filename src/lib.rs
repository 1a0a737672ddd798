//! # stegotoken 库
//!
//! 本库包含双图像令牌隐写的核心逻辑：比特展开、长度前缀帧、
//! RGB 最低位编解码、令牌拆分与合并，以及重建会话。

// 声明库包含的所有模块。

pub mod bits;
pub mod cli;
pub mod constants;
pub mod error;
pub mod framing;
pub mod handler;
pub mod image_io;
pub mod session;
pub mod steganography;
pub mod token;
