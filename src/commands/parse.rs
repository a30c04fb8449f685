//! # parse 子命令实现
//!
//! 解析选择字符串，逐条列出从根到叶的选择路径。
//!
//! ## 依赖关系
//! - 使用 `cli/parse.rs` 定义的参数
//! - 使用 `select/`

use crate::cli::parse::ParseArgs;

use qrefine::error::Result;
use qrefine::select::{self, Tree};
use qrefine::utils::output;
use tabled::{Table, Tabled};

/// 选择路径行
#[derive(Debug, Clone, Tabled)]
struct PathRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Selection")]
    selection: String,
    #[tabled(rename = "Parts")]
    parts: String,
}

/// 执行选择解析
pub fn execute(args: ParseArgs) -> Result<()> {
    let tree = Tree::from_selection(&args.selection)?;

    if args.mermaid {
        println!("{}", tree.to_mermaid());
        return Ok(());
    }

    output::print_header("Parsed Selection");
    output::print_field("input", &args.selection);
    output::print_field("normalized", &tree.to_string());

    let rows: Vec<PathRow> = tree
        .selections()?
        .enumerate()
        .map(|(i, selection)| PathRow {
            index: i + 1,
            selection: select::selection_to_string(&selection),
            parts: selection
                .iter()
                .map(|part| part.to_string())
                .collect::<Vec<_>>()
                .join(" | "),
        })
        .collect();

    println!();
    println!("{}", Table::new(&rows));
    output::print_success(&format!("{} selection(s)", rows.len()));

    Ok(())
}
