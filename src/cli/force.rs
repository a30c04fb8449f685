//! # force 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/force.rs`

use clap::Args;
use qrefine::refinery::Steps;
use std::path::PathBuf;

/// force 子命令参数
#[derive(Args, Debug)]
pub struct ForceArgs {
    /// Calculation directory with POSCAR and forces.npy
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Atoms and directions to project, e.g. "Sr(x), O(z)"
    #[arg(short, long)]
    pub selection: Option<String>,

    /// Steps of the trajectory: 'last', an index (3) or a range (2:8, :)
    #[arg(long, default_value = "last", value_parser = parse_steps)]
    pub steps: Steps,

    /// Average over the selected atoms instead of summing
    #[arg(long, default_value_t = false)]
    pub average: bool,

    /// Write the projected forces to a CSV file
    #[arg(long)]
    pub output_csv: Option<PathBuf>,
}

fn parse_steps(value: &str) -> Result<Steps, String> {
    value.parse::<Steps>().map_err(|e| e.to_string())
}
