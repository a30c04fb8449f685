//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `raw/`, `refinery/`, `utils/`
//! - 子模块: parse, projector, dos, force

pub mod dos;
pub mod force;
pub mod parse;
pub mod projector;

use crate::cli::Commands;

use qrefine::error::Result;
use qrefine::refinery::{Quantity, Refinery};
use qrefine::utils::output;
use tabled::{Table, Tabled};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Parse(args) => parse::execute(args),
        Commands::Projector(args) => projector::execute(args),
        Commands::Dos(args) => dos::execute(args),
        Commands::Force(args) => force::execute(args),
    }
}

/// 可用选择的表格行
#[derive(Debug, Clone, Tabled)]
struct SelectionRow {
    #[tabled(rename = "Mapping")]
    mapping: String,
    #[tabled(rename = "Valid keys")]
    keys: String,
}

/// 显示物理量的摘要和可用选择
fn show_quantity(quantity: &Quantity) -> Result<()> {
    output::print_header(&format!("Refining {}", quantity.name()));
    println!("{}", quantity.to_display()?);

    // 缺少结构或轨道时不显示可用选择
    let rows: Vec<SelectionRow> = quantity
        .selections()
        .unwrap_or_default()
        .into_iter()
        .map(|(mapping, keys)| SelectionRow {
            mapping,
            keys: keys.join(", "),
        })
        .collect();
    if !rows.is_empty() {
        println!();
        println!("{}", Table::new(&rows));
    }
    Ok(())
}
