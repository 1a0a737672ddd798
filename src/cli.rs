//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::Parser;
use std::path::PathBuf;

/// 把秘密令牌拆成两段，分别以 LSB (最低有效位) 隐写术藏进两张无损图像；
/// 接收方提供两张图像后即可拼回令牌。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "把秘密令牌拆成两段，分别以 LSB (最低有效位) 隐写术藏进两张无损图像 (如 PNG, BMP)。\n单独一张图像没有意义，只有两张同时具备时才能还原令牌。"
)]
pub struct Cli {
    /// 输出调试日志 (写入 stderr)。
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 在无损格式图像中隐藏一个文件的内容。
    Hide(HideArgs),

    /// 从经过隐写的图像中恢复隐藏的内容。
    Recover(RecoverArgs),

    /// 拆分令牌，并把两段分别隐藏到两张图像中。
    Split(SplitArgs),

    /// 从两张图像中提取分片并拼回令牌。
    Combine(CombineArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入图像文件路径 (如 PNG, BMP)。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的内容的文件路径。
    #[arg(short, long)]
    pub text: PathBuf,

    /// 结果图像的输出路径，默认为输入图像旁的 `doctored_<name>.png`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复内容的输出路径，默认为图像旁的 `recovered_<name>.txt`。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'split' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct SplitArgs {
    /// 要拆分的令牌。
    #[arg(short, long)]
    pub token: String,

    /// 承载前半段的载体图像 (图像 1)。
    #[arg(long)]
    pub first: PathBuf,

    /// 承载后半段的载体图像 (图像 2)。
    #[arg(long)]
    pub second: PathBuf,

    /// 前半段的拆分位置 (按字符计)，默认取中点。
    #[arg(long)]
    pub at: Option<usize>,

    /// 图像 1 的输出路径，默认为 `doctored_<name>_1.png`。
    #[arg(long)]
    pub first_dest: Option<PathBuf>,

    /// 图像 2 的输出路径，默认为 `doctored_<name>_2.png`。
    #[arg(long)]
    pub second_dest: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}

/// 'combine' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CombineArgs {
    /// 图像 1，其分片放在令牌前部。
    #[arg(long)]
    pub first: PathBuf,

    /// 图像 2，其分片放在令牌后部。
    #[arg(long)]
    pub second: PathBuf,

    /// 令牌的输出文件，缺省时打印到标准输出。
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// 允许覆盖已存在的输出文件。
    #[arg(short, long)]
    pub force: bool,
}
