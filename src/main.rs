//! # qrefine 命令行入口
//!
//! ## 子命令
//! - `parse` - 解析选择字符串
//! - `projector` - 显示可用的原子、轨道和自旋
//! - `dos` - 态密度精炼、导出和绘图
//! - `force` - 受力精炼和投影
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     └── qrefine (库: refinery/, raw/, export.rs, plot.rs)
//!   └── qrefine::config, qrefine::utils::output (错误输出)
//! ```

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use qrefine::config::OutputConfig;
use qrefine::utils::output;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    let config = OutputConfig::new(cli.verbose);

    if let Err(e) = commands::run(cli.command) {
        output::report_error(&e, &config);
        std::process::exit(1);
    }
}
