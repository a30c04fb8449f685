//! # 轨迹步选择
//!
//! 不可变的步选择值，作为参数传给读取函数。索引从 0 开始，
//! 范围不含终点：
//!
//! | 字符串 | 含义 |
//! |---|---|
//! | `last` | 最后一步 |
//! | `3` | 第 3 步 |
//! | `2:8` | 第 2 到 7 步 |
//! | `:5`, `5:` | 省略的一端取到轨迹边界 |
//! | `:` | 全部 |
//!
//! ## 依赖关系
//! - 被 `refinery/force.rs` 和 `cli/` 使用

use crate::error::{QrefineError, Result};
use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use std::fmt;
use std::str::FromStr;

/// 轨迹中被选中的步
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Steps {
    #[default]
    Last,
    Single(usize),
    Range {
        start: Option<usize>,
        stop: Option<usize>,
    },
    All,
}

impl Steps {
    /// 选择单步时结果没有步维度
    pub fn is_single(&self) -> bool {
        matches!(self, Steps::Last | Steps::Single(_))
    }

    /// 选中的最后一步的索引
    pub fn last_index(&self, len: usize) -> Result<usize> {
        let (start, stop) = self.bounds(len)?;
        if stop <= start {
            return Err(self.out_of_bounds(len));
        }
        Ok(stop - 1)
    }

    /// 沿第 0 维取出选中的步
    pub fn select(&self, data: ArrayViewD<'_, f64>) -> Result<ArrayD<f64>> {
        let len = data.len_of(Axis(0));
        let (start, stop) = self.bounds(len)?;
        if self.is_single() {
            return Ok(data.index_axis(Axis(0), start).to_owned());
        }
        Ok(data
            .slice_axis(Axis(0), Slice::from(start..stop))
            .to_owned())
    }

    fn bounds(&self, len: usize) -> Result<(usize, usize)> {
        match *self {
            Steps::Last => match len {
                0 => Err(self.out_of_bounds(len)),
                _ => Ok((len - 1, len)),
            },
            Steps::Single(index) if index < len => Ok((index, index + 1)),
            Steps::Single(_) => Err(self.out_of_bounds(len)),
            Steps::Range { start, stop } => {
                let stop = stop.unwrap_or(len);
                let start = start.unwrap_or(0);
                if stop > len || start > stop {
                    return Err(self.out_of_bounds(len));
                }
                Ok((start, stop))
            }
            Steps::All => Ok((0, len)),
        }
    }

    fn out_of_bounds(&self, len: usize) -> QrefineError {
        QrefineError::InvalidArgument(format!(
            "Please check if the steps `{}` are properly formatted and within the boundaries of the trajectory with {} steps.",
            self, len
        ))
    }
}

impl fmt::Display for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: &Option<usize>| b.map(|b| b.to_string()).unwrap_or_default();
        match self {
            Steps::Last => write!(f, "last"),
            Steps::Single(index) => write!(f, "{}", index),
            Steps::Range { start, stop } => write!(f, "{}:{}", bound(start), bound(stop)),
            Steps::All => write!(f, ":"),
        }
    }
}

impl FromStr for Steps {
    type Err = QrefineError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || {
            QrefineError::InvalidArgument(format!(
                "Invalid steps '{}'. Use 'last', a step index (e.g. 3) or a range (e.g. 2:8).",
                s
            ))
        };
        let bound = |b: &str| -> Result<Option<usize>> {
            match b.trim() {
                "" => Ok(None),
                b => b.parse().map(Some).map_err(|_| invalid()),
            }
        };

        if s.eq_ignore_ascii_case("last") {
            return Ok(Steps::Last);
        }
        match s.split_once(':') {
            Some((start, stop)) => match (bound(start)?, bound(stop)?) {
                (None, None) => Ok(Steps::All),
                (start, stop) => Ok(Steps::Range { start, stop }),
            },
            None => s.parse().map(Steps::Single).map_err(|_| invalid()),
        }
    }
}
