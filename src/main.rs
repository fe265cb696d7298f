mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    apicase::logger::init_logger();

    let cli = Cli::parse();
    let exit_code = cli::run(cli).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
