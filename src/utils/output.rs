//! # 美化输出工具
//!
//! 提供统一的终端输出样式。
//!
//! ## 依赖关系
//! - 被 `main.rs` 和 `commands/` 使用
//! - 使用 `config.rs` 决定错误的详细程度
//! - 使用 `colored` crate

use crate::config::OutputConfig;
use crate::error::QrefineError;

use colored::Colorize;
use std::error::Error;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// 打印 `key: value` 形式的一行
pub fn print_field(key: &str, value: &str) {
    println!("  {} {}", format!("{}:", key).cyan(), value);
}

/// 按配置打印错误；程序 bug 附带提示和完整来源链
pub fn report_error(err: &QrefineError, config: &OutputConfig) {
    print_error(&err.to_string());
    if !config.show_chain(err.is_user_error()) {
        return;
    }
    for cause in error_chain(err) {
        eprintln!("      {} {}", "caused by:".dimmed(), cause);
    }
    if !err.is_user_error() {
        eprintln!(
            "      {}",
            "This looks like a bug in qrefine, please report it.".dimmed()
        );
    }
}

/// 错误来源链（不含错误本身）
pub fn error_chain(err: &dyn Error) -> Vec<String> {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_collects_sources() {
        let err = QrefineError::FileReadError {
            path: "POSCAR".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(error_chain(&err), vec!["missing".to_string()]);
        assert!(error_chain(&QrefineError::NoData("none".into())).is_empty());
    }
}
