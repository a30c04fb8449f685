//! # 求和项
//!
//! 一条选择路径展开后的单个带符号项：每个轴上选中的索引、
//! 标签片段以及因子（来自 `+`/`-` 运算）。
//!
//! ## 依赖关系
//! - 被 `index/mod.rs` 使用

use crate::error::{SelectResult, SelectionError};

#[derive(Debug, Clone)]
pub(super) struct Term {
    indices: Vec<Option<Vec<usize>>>,
    keys: Vec<Option<String>>,
    pub(super) factor: f64,
}

impl Term {
    /// 不限制任何轴的项
    pub(super) fn new(ndim: usize) -> Self {
        Term {
            indices: vec![None; ndim],
            keys: vec![None; ndim],
            factor: 1.0,
        }
    }

    pub(super) fn with_axis(ndim: usize, axis: usize, indices: Vec<usize>, key: String) -> Self {
        let mut term = Term::new(ndim);
        term.indices[axis] = Some(indices);
        term.keys[axis] = Some(key);
        term
    }

    /// 合并两个项；同一个轴不能被限制两次
    pub(super) fn merge(&self, other: &Term) -> SelectResult<Term> {
        let mut merged = Term::new(self.indices.len());
        for axis in 0..self.indices.len() {
            if let (Some(left), Some(right)) = (&self.keys[axis], &other.keys[axis]) {
                return Err(SelectionError::IncorrectUsage(format!(
                    "Conflicting keys '{}' and '{}' act on the same index.",
                    left, right
                )));
            }
            merged.indices[axis] = self.indices[axis]
                .clone()
                .or_else(|| other.indices[axis].clone());
            merged.keys[axis] = self.keys[axis].clone().or_else(|| other.keys[axis].clone());
        }
        merged.factor = self.factor * other.factor;
        Ok(merged)
    }

    pub(super) fn indices(&self, axis: usize) -> Option<&[usize]> {
        self.indices[axis].as_deref()
    }

    /// 标签：按轴顺序用 `_` 连接键，第一个项之后带 `+ `/`- ` 前缀
    pub(super) fn label(&self, position: usize, axes: &[usize]) -> String {
        let sign = match (position, self.factor < 0.0) {
            (0, false) => "",
            (0, true) => "-",
            (_, false) => "+ ",
            (_, true) => "- ",
        };
        let keys: Vec<&str> = axes
            .iter()
            .filter_map(|&axis| self.keys[axis].as_deref())
            .collect();
        format!("{}{}", sign, keys.join("_"))
    }
}
