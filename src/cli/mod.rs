//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `parse`: 解析选择字符串并显示得到的选择
//! - `projector`: 显示计算目录中可用的投影
//! - `dos`: 精炼态密度
//! - `force`: 精炼原子受力
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: parse, projector, dos, force

pub mod dos;
pub mod force;
pub mod parse;
pub mod projector;

use clap::{Parser, Subcommand};

/// qrefine - 基于选择字符串的 VASP 数据精炼工具
#[derive(Parser)]
#[command(name = "qrefine")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Selection-driven refinement of VASP output arrays", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show the full error chain when a command fails
    #[arg(short, long, global = true, env = "QREFINE_VERBOSE", default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Parse a selection string and list the resulting selections
    Parse(parse::ParseArgs),

    /// Show the atoms, orbitals and spins available for selections
    Projector(projector::ProjectorArgs),

    /// Refine the density of states, optionally projected on a selection
    Dos(dos::DosArgs),

    /// Refine the forces on the atoms along the trajectory
    Force(force::ForceArgs),
}
