//! # dos 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/dos.rs`

use clap::Args;
use std::path::PathBuf;

/// dos 子命令参数
#[derive(Args, Debug)]
pub struct DosArgs {
    /// Calculation directory with POSCAR and the .npy arrays
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Projections to add, e.g. "Sr(p), Ti(d)"
    #[arg(short, long)]
    pub selection: Option<String>,

    /// Fermi energy in eV, overrides fermi_energy.npy
    #[arg(long, allow_hyphen_values = true)]
    pub fermi_energy: Option<f64>,

    /// Comma separated orbital names, overrides orbitals.txt
    #[arg(long, value_delimiter = ',')]
    pub orbitals: Option<Vec<String>>,

    /// Write the refined DOS to a CSV file
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Plot the refined DOS (.png or .svg)
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
