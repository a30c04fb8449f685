//! # projector 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/projector.rs`

use clap::Args;
use std::path::PathBuf;

/// projector 子命令参数
#[derive(Args, Debug)]
pub struct ProjectorArgs {
    /// Calculation directory with POSCAR and the .npy arrays
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Comma separated orbital names, overrides orbitals.txt
    #[arg(long, value_delimiter = ',')]
    pub orbitals: Option<Vec<String>>,
}
