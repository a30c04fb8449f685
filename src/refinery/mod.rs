//! # 精炼层
//!
//! 把原始数组整理成带标签的字典或可读文本。每个物理量是一个独立的结构体，
//! 共同实现 [`Refinery`]；[`Quantity`] 把它们收拢成一个枚举供命令行分发。
//!
//! ## 依赖关系
//! - 使用 `raw/` 读取数组，`index/` 和 `select/` 解析用户选择
//! - 被 `commands/`、`export.rs` 和 `plot.rs` 使用
//! - 子模块: projector, dos, force, steps

pub mod dos;
pub mod force;
pub mod projector;
pub mod steps;

pub use dos::Dos;
pub use force::Force;
pub use projector::Projector;
pub use steps::Steps;

use crate::error::{QrefineError, Result};
use ndarray::ArrayD;

// ─────────────────────────────────────────────────────────────
// 字典
// ─────────────────────────────────────────────────────────────

/// 字典中的值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Array(ArrayD<f64>),
    Text(String),
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(value: ArrayD<f64>) -> Self {
        Value::Array(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// 保持插入顺序的字典，键重复时覆盖原值并返回旧值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(String, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => Some(std::mem::replace(&mut entry.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn array(&self, key: &str) -> Result<&ArrayD<f64>> {
        match self.get(key) {
            Some(Value::Array(array)) => Ok(array),
            _ => Err(QrefineError::NoData(format!("No array '{}' in the data.", key))),
        }
    }

    pub fn scalar(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(Value::Scalar(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 所有一维数组，按插入顺序
    pub fn series(&self) -> impl Iterator<Item = (&str, &ArrayD<f64>)> {
        self.iter().filter_map(|(k, v)| match v {
            Value::Array(array) if array.ndim() == 1 => Some((k, array)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Dict {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 精炼接口
// ─────────────────────────────────────────────────────────────

/// 把原始数据精炼为字典或文本
pub trait Refinery {
    fn to_dict(&self) -> Result<Dict>;

    fn to_display(&self) -> Result<String>;

    /// 各映射可用的选择，键为映射名称
    fn selections(&self) -> Result<Vec<(String, Vec<String>)>> {
        Ok(Vec::new())
    }
}

/// 支持的物理量
pub enum Quantity<'a> {
    Projector(Projector),
    Dos(Dos<'a>),
    Force(Force<'a>),
}

impl Quantity<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Quantity::Projector(_) => "projector",
            Quantity::Dos(_) => "dos",
            Quantity::Force(_) => "force",
        }
    }

    fn refinery(&self) -> &dyn Refinery {
        match self {
            Quantity::Projector(projector) => projector,
            Quantity::Dos(dos) => dos,
            Quantity::Force(force) => force,
        }
    }
}

impl Refinery for Quantity<'_> {
    fn to_dict(&self) -> Result<Dict> {
        self.refinery().to_dict()
    }

    fn to_display(&self) -> Result<String> {
        self.refinery().to_display()
    }

    fn selections(&self) -> Result<Vec<(String, Vec<String>)>> {
        self.refinery().selections()
    }
}
