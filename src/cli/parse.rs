//! # parse 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/parse.rs`

use clap::Args;

/// parse 子命令参数
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Selection string, e.g. "Sr(p), Ti(d) - O(p)"
    pub selection: String,

    /// Print the parse tree as a Mermaid diagram
    #[arg(long, default_value_t = false)]
    pub mermaid: bool,
}
