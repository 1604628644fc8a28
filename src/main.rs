mod cli;

use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() {
    // 初始化日志系统
    postrun::logger::init_logger();

    let cli = Cli::parse();
    let exit_code = cli::run(cli).await;
    std::process::exit(exit_code);
}
