//! # 解析器模块
//!
//! 读取计算目录中的结构文件。
//!
//! ## 依赖关系
//! - 被 `raw/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: poscar

pub mod poscar;

use crate::error::{QrefineError, Result};
use crate::models::Structure;
use std::path::Path;

/// 在计算目录中查找结构文件，POSCAR 不存在时使用 CONTCAR
pub fn find_structure_file(dir: &Path) -> Result<Structure> {
    for name in ["POSCAR", "CONTCAR"] {
        let path = dir.join(name);
        if path.is_file() {
            return poscar::parse_poscar_file(&path);
        }
    }
    Err(QrefineError::NoData(format!(
        "No POSCAR or CONTCAR found in '{}'.",
        dir.display()
    )))
}
