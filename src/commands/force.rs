//! # force 子命令实现
//!
//! 显示选中步的受力，并按原子和方向投影。
//!
//! ## 依赖关系
//! - 使用 `cli/force.rs` 定义的参数
//! - 使用 `raw/`, `refinery/force.rs`, `export.rs`

use super::show_quantity;
use crate::cli::force::ForceArgs;

use qrefine::error::Result;
use qrefine::export;
use qrefine::index::Reduction;
use qrefine::raw::NpyDirectory;
use qrefine::refinery::{Force, Quantity, Refinery, Value};
use qrefine::utils::output;
use tabled::{Table, Tabled};

/// 投影结果行
#[derive(Debug, Clone, Tabled)]
struct ProjectionRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Force (eV/Angst)")]
    value: String,
}

/// 执行力精炼
pub fn execute(args: ForceArgs) -> Result<()> {
    let directory = NpyDirectory::open(&args.dir)?;
    output::print_info(&format!(
        "Reading '{}' (steps: {})",
        directory.root().display(),
        args.steps
    ));

    let reduction = if args.average {
        Reduction::Average
    } else {
        Reduction::Sum
    };
    let force = Force::new(&directory)
        .with_steps(args.steps)
        .with_selection(args.selection.as_deref())
        .with_reduction(reduction);
    let dict = force.to_dict()?;
    show_quantity(&Quantity::Force(force))?;

    let rows: Vec<ProjectionRow> = dict
        .iter()
        .filter(|(label, _)| !matches!(*label, "formula" | "forces"))
        .filter_map(|(label, value)| match value {
            Value::Array(values) => Some(ProjectionRow {
                label: label.to_string(),
                value: values
                    .iter()
                    .map(|v| format!("{:.6}", v))
                    .collect::<Vec<_>>()
                    .join(" "),
            }),
            _ => None,
        })
        .collect();
    if !rows.is_empty() {
        output::print_header("Projected Forces");
        println!("{}", Table::new(&rows));
    }

    if let Some(path) = &args.output_csv {
        export::dict_to_csv(&dict, path)?;
        output::print_success(&format!("Forces saved to '{}'", path.display()));
    }

    Ok(())
}
