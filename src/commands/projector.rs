//! # projector 子命令实现
//!
//! ## 依赖关系
//! - 使用 `cli/projector.rs` 定义的参数
//! - 使用 `raw/` 和 `refinery/projector.rs`

use super::show_quantity;
use crate::cli::projector::ProjectorArgs;

use qrefine::error::Result;
use qrefine::raw::{NpyDirectory, WithOrbitals};
use qrefine::refinery::{Projector, Quantity};
use qrefine::utils::output;

/// 显示可用投影
pub fn execute(args: ProjectorArgs) -> Result<()> {
    let directory = NpyDirectory::open(&args.dir)?;
    output::print_info(&format!("Reading '{}'", directory.root().display()));

    let projector = match args.orbitals {
        Some(orbitals) => Projector::from_source(&WithOrbitals::new(&directory, orbitals))?,
        None => Projector::from_source(&directory)?,
    };
    if !projector.has_orbitals() {
        output::print_warning("No orbitals found, write orbitals.txt or pass --orbitals.");
    }

    show_quantity(&Quantity::Projector(projector))
}
