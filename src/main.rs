use clap::Parser;
use tracing::Level;

use stegotoken::{
    cli::{Cli, Commands},
    handler::{handle_combine, handle_hide, handle_recover, handle_split},
};

/// 程序的主入口点
///
/// 负责解析命令行参数、初始化日志，并根据指定的子命令
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Recover(args) => handle_recover(args),
        Commands::Split(args) => handle_split(args),
        Commands::Combine(args) => handle_combine(args),
    }
}
