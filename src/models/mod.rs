//! # 数据模型模块
//!
//! 定义晶体结构和化学计量，用于构建原子维度的映射。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `refinery/` 使用
//! - 子模块: structure

pub mod structure;

pub use structure::{Lattice, Stoichiometry, Structure};
