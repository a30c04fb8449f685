//! # dos 子命令实现
//!
//! 精炼态密度并可选导出 CSV 和绘图。
//!
//! ## 依赖关系
//! - 使用 `cli/dos.rs` 定义的参数
//! - 使用 `raw/`, `refinery/dos.rs`
//! - 使用 `export.rs`, `plot.rs`

use super::show_quantity;
use crate::cli::dos::DosArgs;

use qrefine::error::Result;
use qrefine::export;
use qrefine::plot::{self, PlotOptions};
use qrefine::raw::{NpyDirectory, RawSource, WithOrbitals};
use qrefine::refinery::{Dos, Quantity};
use qrefine::utils::output;
use tabled::{Table, Tabled};

/// 每条 DOS 曲线的摘要
#[derive(Debug, Clone, Tabled)]
struct CurveRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Points")]
    points: usize,
    #[tabled(rename = "Max")]
    max: String,
}

/// 执行 DOS 精炼
pub fn execute(args: DosArgs) -> Result<()> {
    let directory = NpyDirectory::open(&args.dir)?;
    output::print_info(&format!("Reading '{}'", directory.root().display()));

    let overridden = args
        .orbitals
        .map(|orbitals| WithOrbitals::new(&directory, orbitals));
    let source: &dyn RawSource = match &overridden {
        Some(source) => source,
        None => &directory,
    };

    let dos = Dos::new(source)
        .with_selection(args.selection.as_deref())
        .with_fermi_energy(args.fermi_energy);
    let (dict, replaced) = dos.refine()?;
    let title = format!("DOS of {}", args.dir.display());
    let quantity = Quantity::Dos(dos);
    show_quantity(&quantity)?;
    for label in &replaced {
        output::print_warning(&format!(
            "The projection '{}' replaced the entry of the same name.",
            label
        ));
    }

    let rows: Vec<CurveRow> = dict
        .series()
        .skip(1)
        .map(|(label, values)| CurveRow {
            label: label.to_string(),
            points: values.len(),
            max: format!(
                "{:.4}",
                values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            ),
        })
        .collect();
    output::print_header("Refined Curves");
    println!("{}", Table::new(&rows));
    if let Some(fermi_energy) = dict.scalar("fermi_energy") {
        output::print_field("fermi energy (eV)", &format!("{:.4}", fermi_energy));
    }

    if let Some(path) = &args.output_csv {
        export::dict_to_csv(&dict, path)?;
        output::print_success(&format!("DOS saved to '{}'", path.display()));
    }

    if let Some(path) = &args.plot {
        plot::generate_line_plot(&dict, path, &PlotOptions::dos(title))?;
        output::print_success(&format!("DOS plot saved to '{}'", path.display()));
    }

    Ok(())
}
