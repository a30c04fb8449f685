//! # 基于映射的数组索引选择
//!
//! VASP 的很多输出需要按用户选择提取某个分量，例如绘制 p 轨道的 DOS。
//! [`Selector`] 接收 [`crate::select::Tree`] 生成的选择，从数组中取出相应部分：
//!
//! ```
//! use ndarray::{Array, IxDyn};
//! use qrefine::index::{AxisMap, Maps, Selector};
//! use qrefine::select::Part;
//!
//! let data = Array::from_shape_fn(IxDyn(&[10, 2, 3]), |i| (i[0] + i[1] + i[2]) as f64);
//! let maps = Maps::new()
//!     .with(1, AxisMap::from_iter([("A", 0usize), ("B", 1)]))
//!     .with(2, AxisMap::from_iter([("x", 0usize), ("y", 1), ("z", 2)]));
//! let selector = Selector::new(maps, data.view()).unwrap();
//! let a_x = selector.get(&[Part::from("A"), Part::from("x")]).unwrap();
//! assert_eq!(a_x.shape(), &[10]);
//! ```
//!
//! `maps` 的键指定数组的维度，值将标签映射到该维度的索引。每个被映射的
//! 维度默认选择全部分量，并对选中的分量求和（不做平均），
//! 因此结果的维度 = 数据维度 - 映射个数。
//!
//! ## 依赖关系
//! - 使用 `select/` 的选择词汇
//! - 使用 `suggest.rs` 生成拼写建议
//! - 使用 `ndarray` 进行切片和求和，`rayon` 并行解析多个选择
//! - 子模块: term

mod term;

use crate::error::{SelectResult, SelectionError};
use crate::select::{Group, Part, Selection, Separator, ALL};
use crate::suggest;

use ndarray::{ArrayD, ArrayViewD, Axis, CowArray, IxDyn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::ops::Range;
use term::Term;

// ─────────────────────────────────────────────────────────────
// 索引描述
// ─────────────────────────────────────────────────────────────

/// 与 Python 切片语义相同的索引范围，越界部分被截断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<usize>,
    pub stop: Option<usize>,
    pub step: usize,
}

impl Slice {
    pub fn new(start: usize, stop: usize) -> Self {
        Slice {
            start: Some(start),
            stop: Some(stop),
            step: 1,
        }
    }

    /// 整个轴
    pub fn full() -> Self {
        Slice {
            start: None,
            stop: None,
            step: 1,
        }
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step.max(1);
        self
    }

    fn bounds(&self, len: usize) -> (usize, usize) {
        let start = self.start.unwrap_or(0).min(len);
        let stop = self.stop.unwrap_or(len).min(len).max(start);
        (start, stop)
    }

    fn indices(&self, len: usize) -> Vec<usize> {
        let (start, stop) = self.bounds(len);
        (start..stop).step_by(self.step.max(1)).collect()
    }
}

/// 一个键所指向的索引：单个索引、索引列表或切片
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    Single(usize),
    List(Vec<usize>),
    Slice(Slice),
}

impl IndexSpec {
    /// 展开为具体索引，单个索引和列表越界时报错
    pub fn indices(&self, axis: usize, len: usize) -> SelectResult<Vec<usize>> {
        let indices = match self {
            IndexSpec::Single(index) => vec![*index],
            IndexSpec::List(indices) => indices.clone(),
            IndexSpec::Slice(slice) => return Ok(slice.indices(len)),
        };
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Err(SelectionError::ShapeMismatch { axis, index, len });
        }
        Ok(indices)
    }

    /// 若索引连续（步长为 1）则返回 `start..stop`
    fn contiguous(&self, axis: usize, len: usize) -> SelectResult<Option<Range<usize>>> {
        if let IndexSpec::Slice(slice) = self {
            if slice.step != 1 {
                return Ok(None);
            }
            let (start, stop) = slice.bounds(len);
            return Ok(Some(start..stop));
        }
        let indices = self.indices(axis, len)?;
        let Some(&first) = indices.first() else {
            return Ok(None);
        };
        let consecutive = indices
            .iter()
            .enumerate()
            .all(|(offset, &index)| index == first + offset);
        Ok(consecutive.then(|| first..first + indices.len()))
    }
}

impl From<usize> for IndexSpec {
    fn from(index: usize) -> Self {
        IndexSpec::Single(index)
    }
}

impl From<Vec<usize>> for IndexSpec {
    fn from(indices: Vec<usize>) -> Self {
        IndexSpec::List(indices)
    }
}

impl From<Slice> for IndexSpec {
    fn from(slice: Slice) -> Self {
        IndexSpec::Slice(slice)
    }
}

impl From<Range<usize>> for IndexSpec {
    fn from(range: Range<usize>) -> Self {
        IndexSpec::Slice(Slice::new(range.start, range.end))
    }
}

// ─────────────────────────────────────────────────────────────
// 映射
// ─────────────────────────────────────────────────────────────

/// 单个轴上标签到索引的有序映射，键唯一且区分大小写
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisMap {
    entries: Vec<(String, IndexSpec)>,
}

impl AxisMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入键；已存在的键被覆盖并保留原位置
    pub fn insert(&mut self, key: impl Into<String>, spec: impl Into<IndexSpec>) {
        let key = key.into();
        let spec = spec.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = spec,
            None => self.entries.push((key, spec)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&IndexSpec> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexSpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<IndexSpec>> FromIterator<(K, V)> for AxisMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AxisMap::new();
        for (key, spec) in iter {
            map.insert(key, spec);
        }
        map
    }
}

/// 数组维度到映射的有序集合；插入顺序决定标签中各片段的顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Maps {
    axes: Vec<(usize, AxisMap)>,
}

impl Maps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, axis: usize, map: AxisMap) -> Self {
        self.insert(axis, map);
        self
    }

    pub fn insert(&mut self, axis: usize, map: AxisMap) {
        match self.axes.iter_mut().find(|(a, _)| *a == axis) {
            Some(entry) => entry.1 = map,
            None => self.axes.push((axis, map)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AxisMap)> {
        self.axes.iter().map(|(axis, map)| (*axis, map))
    }

    pub fn axes(&self) -> Vec<usize> {
        self.axes.iter().map(|(axis, _)| *axis).collect()
    }
}

// ─────────────────────────────────────────────────────────────
// Selector
// ─────────────────────────────────────────────────────────────

/// 对被映射维度的约化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    /// 直接求和
    #[default]
    Sum,
    /// 求和后除以选中的分量数，只在调用方明确要求时使用
    Average,
}

/// Selector 的可选行为
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorOptions {
    /// 数字键标注为 `<名称>_<序号>`，例如原子 `2` 标注为 `Ti_1`
    pub use_number_labels: bool,
    pub reduction: Reduction,
}

/// 解析用户选择并从数组中取出对应部分
///
/// 不持有也不修改数据，只返回新的数组。
#[derive(Debug)]
pub struct Selector<'a> {
    data: ArrayViewD<'a, f64>,
    axes: Vec<usize>,
    lookup: HashMap<String, (usize, IndexSpec)>,
    valid_keys: Vec<String>,
    number_labels: HashMap<String, String>,
    options: SelectorOptions,
}

impl<'a> Selector<'a> {
    pub fn new(maps: Maps, data: ArrayViewD<'a, f64>) -> SelectResult<Self> {
        Self::with_options(maps, data, SelectorOptions::default())
    }

    pub fn with_options(
        maps: Maps,
        data: ArrayViewD<'a, f64>,
        options: SelectorOptions,
    ) -> SelectResult<Self> {
        let mut lookup: HashMap<String, (usize, IndexSpec)> = HashMap::new();
        let mut valid_keys = Vec::new();

        for (axis, map) in maps.iter() {
            if axis >= data.ndim() {
                return Err(SelectionError::Internal(format!(
                    "A map refers to axis {} but the data has only {} dimensions.",
                    axis,
                    data.ndim()
                )));
            }
            for (key, spec) in map.iter() {
                if key == ALL {
                    return Err(SelectionError::Internal(format!(
                        "The key '{}' is reserved and may not be used in a map.",
                        ALL
                    )));
                }
                if let Some((other, _)) = lookup.get(key) {
                    return Err(SelectionError::AmbiguousKey {
                        key: key.to_string(),
                        axes: vec![*other, axis],
                    });
                }
                lookup.insert(key.to_string(), (axis, spec.clone()));
                valid_keys.push(key.to_string());
            }
        }

        let number_labels = if options.use_number_labels {
            make_number_labels(&maps, &data)?
        } else {
            HashMap::new()
        };

        Ok(Selector {
            data,
            axes: maps.axes(),
            lookup,
            valid_keys,
            number_labels,
            options,
        })
    }

    /// 所有合法的键（按映射的插入顺序）
    pub fn keys(&self) -> &[String] {
        &self.valid_keys
    }

    /// 解析一条选择，返回对所有映射维度约化后的数组
    ///
    /// 空选择等价于选择全部分量。运算展开的各项按符号累加。
    pub fn get(&self, selection: &[Part]) -> SelectResult<ArrayD<f64>> {
        let terms = self.terms(selection)?;
        let mut total: Option<ArrayD<f64>> = None;
        for term in &terms {
            let value = self.reduce(term) * term.factor;
            total = Some(match total {
                Some(sum) => sum + value,
                None => value,
            });
        }
        total.ok_or_else(|| SelectionError::Internal("Selection produced no terms.".to_string()))
    }

    /// 与 [`Selector::get`] 相同路径的可读标签
    pub fn label(&self, selection: &[Part]) -> SelectResult<String> {
        let terms = self.terms(selection)?;
        let labels: Vec<String> = terms
            .iter()
            .enumerate()
            .map(|(position, term)| term.label(position, &self.axes))
            .collect();
        Ok(labels.join(" "))
    }

    /// 并行解析多条选择，按输入顺序返回 `(标签, 数组)`
    pub fn evaluate(&self, selections: &[Selection]) -> SelectResult<Vec<(String, ArrayD<f64>)>> {
        selections
            .par_iter()
            .map(|selection| Ok((self.label(selection)?, self.get(selection)?)))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // 展开选择
    // ─────────────────────────────────────────────────────────────

    fn terms(&self, selection: &[Part]) -> SelectResult<Vec<Term>> {
        let mut terms = vec![Term::new(self.data.ndim())];
        for part in selection {
            let part_terms = self.part_terms(part)?;
            let mut merged = Vec::with_capacity(terms.len() * part_terms.len());
            for left in &terms {
                for right in &part_terms {
                    merged.push(left.merge(right)?);
                }
            }
            terms = merged;
        }
        Ok(terms)
    }

    fn part_terms(&self, part: &Part) -> SelectResult<Vec<Term>> {
        match part {
            Part::Key(key) if key == ALL => Ok(vec![Term::new(self.data.ndim())]),
            Part::Key(key) => Ok(vec![self.read_key(key)?]),
            Part::Group(group) => match group.separator {
                Separator::Range => Ok(vec![self.read_range(group)?]),
                Separator::Pair => Ok(vec![self.read_pair(group)?]),
            },
            Part::Operation(operation) => {
                let mut terms = if operation.is_unary() {
                    Vec::new()
                } else {
                    self.terms(&operation.left)?
                };
                for mut term in self.terms(&operation.right)? {
                    term.factor *= operation.operator.sign();
                    terms.push(term);
                }
                Ok(terms)
            }
        }
    }

    fn find(&self, key: &str) -> SelectResult<&(usize, IndexSpec)> {
        self.lookup.get(key).ok_or_else(|| SelectionError::UnknownKey {
            key: key.to_string(),
            suggestion: suggest::did_you_mean(key, &self.valid_keys),
            valid: self.valid_keys.clone(),
        })
    }

    fn read_key(&self, key: &str) -> SelectResult<Term> {
        let (axis, spec) = self.find(key)?;
        let indices = spec.indices(*axis, self.data.len_of(Axis(*axis)))?;
        Ok(Term::with_axis(
            self.data.ndim(),
            *axis,
            indices,
            self.display_key(key),
        ))
    }

    fn read_range(&self, range: &Group) -> SelectResult<Term> {
        let [first, last] = range.elements.as_slice() else {
            return Err(SelectionError::IncorrectUsage(format!(
                "The range {} must consist of exactly two elements.",
                range
            )));
        };
        let (first_axis, first_spec) = self.find(first)?;
        let (last_axis, last_spec) = self.find(last)?;
        if first_axis != last_axis {
            return Err(SelectionError::IncorrectUsage(format!(
                "The range {} could not be read, because the components correspond to different dimensions.",
                range
            )));
        }

        let axis = *first_axis;
        let len = self.data.len_of(Axis(axis));
        let (Some(start), Some(stop)) = (
            first_spec.contiguous(axis, len)?,
            last_spec.contiguous(axis, len)?,
        ) else {
            return Err(SelectionError::IncorrectUsage(format!(
                "Cannot read range {} because the data is not contiguous.",
                range
            )));
        };
        if stop.end <= start.start {
            return Err(SelectionError::IncorrectUsage(format!(
                "The range {} is empty, the first element must precede the last one.",
                range
            )));
        }

        Ok(Term::with_axis(
            self.data.ndim(),
            axis,
            (start.start..stop.end).collect(),
            range.to_string(),
        ))
    }

    fn read_pair(&self, pair: &Group) -> SelectResult<Term> {
        let key = pair.to_string();
        if self.lookup.contains_key(&key) {
            return self.read_key(&key);
        }
        let reversed = pair.reversed().to_string();
        if self.lookup.contains_key(&reversed) {
            return self.read_key(&reversed);
        }
        self.read_key(&key)
    }

    fn display_key(&self, key: &str) -> String {
        self.number_labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    // ─────────────────────────────────────────────────────────────
    // 数值计算
    // ─────────────────────────────────────────────────────────────

    /// 取出选中的索引并沿所有映射维度约化
    fn reduce(&self, term: &Term) -> ArrayD<f64> {
        let mut current: CowArray<'_, f64, IxDyn> = CowArray::from(self.data.view());
        for &axis in &self.axes {
            if let Some(indices) = term.indices(axis) {
                current = CowArray::from(current.select(Axis(axis), indices));
            }
        }

        let mut axes = self.axes.clone();
        axes.sort_unstable_by(|a, b| b.cmp(a));

        let mut result = current.into_owned();
        for axis in axes {
            let count = result.len_of(Axis(axis));
            result = result.sum_axis(Axis(axis));
            if self.options.reduction == Reduction::Average {
                result /= count as f64;
            }
        }
        result
    }
}

fn is_decimal(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())
}

/// 数字键 -> `<名称>_<序号>`，名称取同一映射中第一个包含该索引的非数字键
fn make_number_labels(
    maps: &Maps,
    data: &ArrayViewD<'_, f64>,
) -> SelectResult<HashMap<String, String>> {
    let mut labels = HashMap::new();
    for (axis, map) in maps.iter() {
        let len = data.len_of(Axis(axis));
        for (key, spec) in map.iter().filter(|(key, _)| is_decimal(key)) {
            let indices = spec.indices(axis, len)?;
            let [index] = indices.as_slice() else {
                return Err(SelectionError::Internal(format!(
                    "Integer label {} maps to more than a single index.",
                    key
                )));
            };
            let mut label = key.to_string();
            for (name, named_spec) in map.iter().filter(|(name, _)| !is_decimal(name)) {
                let named = named_spec.indices(axis, len)?;
                if let Some(position) = named.iter().position(|i| i == index) {
                    label = format!("{}_{}", name, position + 1);
                    break;
                }
            }
            labels.insert(key.to_string(), label);
        }
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::Tree;
    use ndarray::{Array, Array1, Array2};

    fn squares() -> ArrayD<f64> {
        Array1::from_iter((0..10).map(|i| (i * i) as f64)).into_dyn()
    }

    fn key(k: &str) -> Vec<Part> {
        vec![Part::from(k)]
    }

    fn parse(selection: &str) -> Selection {
        let mut selections: Vec<Selection> =
            Tree::from_selection(selection).unwrap().selections().unwrap().collect();
        assert_eq!(selections.len(), 1);
        selections.remove(0)
    }

    fn scalar(array: &ArrayD<f64>) -> f64 {
        assert_eq!(array.ndim(), 0);
        array.sum()
    }

    fn structure_maps() -> Maps {
        // 2 Sr, 1 Ti, 3 O
        Maps::new()
            .with(
                1,
                AxisMap::from_iter([
                    ("Sr", IndexSpec::from(0..2)),
                    ("Ti", IndexSpec::from(2)),
                    ("O", IndexSpec::from(3..6)),
                    ("1", IndexSpec::from(0)),
                    ("2", IndexSpec::from(1)),
                    ("3", IndexSpec::from(2)),
                    ("4", IndexSpec::from(3)),
                    ("5", IndexSpec::from(4)),
                    ("6", IndexSpec::from(5)),
                ]),
            )
            .with(
                2,
                AxisMap::from_iter([("x", 0usize), ("y", 1), ("z", 2)]),
            )
    }

    fn forces() -> ArrayD<f64> {
        Array::from_shape_fn(IxDyn(&[2, 6, 3]), |i| {
            (100 * i[0] + 10 * i[1] + i[2]) as f64
        })
    }

    #[test]
    fn test_list_and_strided_slice_are_summed() {
        let data = squares();
        let maps = Maps::new().with(
            0,
            AxisMap::from_iter([
                ("A", IndexSpec::from(vec![1, 2])),
                ("B", IndexSpec::from(Slice::new(3, 8).with_step(2))),
            ]),
        );
        let selector = Selector::new(maps, data.view()).unwrap();
        assert_eq!(scalar(&selector.get(&key("A")).unwrap()), 1.0 + 4.0);
        assert_eq!(scalar(&selector.get(&key("B")).unwrap()), 9.0 + 25.0 + 49.0);
    }

    #[test]
    fn test_single_index() {
        let data = squares();
        let maps = Maps::new().with(0, AxisMap::from_iter([("Sr", 1usize), ("Ti", 2), ("O", 3)]));
        let selector = Selector::new(maps, data.view()).unwrap();
        assert_eq!(scalar(&selector.get(&key("Ti")).unwrap()), 4.0);
        assert_eq!(selector.label(&key("Ti")).unwrap(), "Ti");
    }

    #[test]
    fn test_column_extraction_keeps_unmapped_axis() {
        let m = Array2::from_shape_fn((3, 10), |(i, j)| (10 * i + j) as f64).into_dyn();
        let maps = Maps::new().with(
            1,
            AxisMap::from_iter([
                ("x", IndexSpec::from(0..1)),
                ("y", IndexSpec::from(1..2)),
                ("z", IndexSpec::from(2..3)),
            ]),
        );
        let selector = Selector::new(maps, m.view()).unwrap();
        let x = selector.get(&key("x")).unwrap();
        assert_eq!(x.shape(), &[3]);
        assert_eq!(x.iter().copied().collect::<Vec<_>>(), vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_default_selection_sums_everything() {
        let data = forces();
        let selector = Selector::new(structure_maps(), data.view()).unwrap();
        let total = selector.get(&[]).unwrap();
        assert_eq!(total.shape(), &[2]);
        let expected: f64 = data.index_axis(Axis(0), 0).sum();
        assert_eq!(total[[0]], expected);
        assert_eq!(selector.get(&key(ALL)).unwrap(), total);
        assert_eq!(selector.label(&[]).unwrap(), "");
    }

    #[test]
    fn test_nested_selection_across_axes() {
        let data = forces();
        let selector = Selector::new(structure_maps(), data.view()).unwrap();
        let selection = parse("Sr(x)");
        let value = selector.get(&selection).unwrap();
        // Sr = 原子 0, 1；x = 分量 0
        assert_eq!(value[[0]], 0.0 + 10.0);
        assert_eq!(value[[1]], 100.0 + 110.0);
        assert_eq!(selector.label(&selection).unwrap(), "Sr_x");
        // 顺序无关
        assert_eq!(selector.get(&parse("x(Sr)")).unwrap(), value);
    }

    #[test]
    fn test_range_group() {
        let data = forces();
        let selector = Selector::new(structure_maps(), data.view()).unwrap();
        let selection = parse("2:4(z)");
        let value = selector.get(&selection).unwrap();
        assert_eq!(value[[0]], 12.0 + 22.0 + 32.0);
        assert_eq!(selector.label(&selection).unwrap(), "2:4_z");
        let spanning = selector.get(&parse("Ti:O(z)")).unwrap();
        assert_eq!(spanning[[0]], 22.0 + 32.0 + 42.0 + 52.0);
    }

    #[test]
    fn test_invalid_ranges() {
        let data = forces();
        let selector = Selector::new(structure_maps(), data.view()).unwrap();
        for (selection, message) in [
            ("1:x", "different dimensions"),
            ("4:2", "is empty"),
        ] {
            let err = selector.get(&parse(selection)).unwrap_err();
            assert!(err.to_string().contains(message), "{}", err);
            assert!(err.is_user_error());
        }
    }

    #[test]
    fn test_non_contiguous_range() {
        let data = squares();
        let maps = Maps::new().with(
            0,
            AxisMap::from_iter([
                ("A", IndexSpec::from(vec![0, 2])),
                ("B", IndexSpec::from(5)),
            ]),
        );
        let selector = Selector::new(maps, data.view()).unwrap();
        let err = selector.get(&parse("A:B")).unwrap_err();
        assert!(err.to_string().contains("not contiguous"));
    }

    #[test]
    fn test_pair_lookup_accepts_both_orders() {
        let data = Array1::from_iter((0..3).map(|i| i as f64)).into_dyn();
        let maps = Maps::new().with(
            0,
            AxisMap::from_iter([("total", 0usize), ("Sr~O", 1), ("Ti~O", 2)]),
        );
        let selector = Selector::new(maps, data.view()).unwrap();
        assert_eq!(scalar(&selector.get(&parse("Sr~O")).unwrap()), 1.0);
        assert_eq!(scalar(&selector.get(&parse("O~Ti")).unwrap()), 2.0);
        assert_eq!(selector.label(&parse("O~Ti")).unwrap(), "Ti~O");
        let err = selector.get(&parse("Sr~Ti")).unwrap_err();
        assert!(matches!(err, SelectionError::UnknownKey { ref key, .. } if key == "Sr~Ti"));
    }

    #[test]
    fn test_operations() {
        let data = forces();
        let selector = Selector::new(structure_maps(), data.view()).unwrap();
        let selection = parse("Sr(x) - Ti(y)");
        let value = selector.get(&selection).unwrap();
        assert_eq!(value[[0]], (0.0 + 10.0) - 21.0);
        assert_eq!(selector.label(&selection).unwrap(), "Sr_x - Ti_y");

        let unary = parse("-O(z)");
        assert_eq!(selector.get(&unary).unwrap()[[0]], -(32.0 + 42.0 + 52.0));
        assert_eq!(selector.label(&unary).unwrap(), "-O_z");

        let nested = parse("Ti(x + z)");
        assert_eq!(selector.get(&nested).unwrap()[[1]], 120.0 + 122.0);
        assert_eq!(selector.label(&nested).unwrap(), "Ti_x + Ti_z");
    }

    #[test]
    fn test_conflicting_keys() {
        let data = forces();
        let selector = Selector::new(structure_maps(), data.view()).unwrap();
        let err = selector.get(&parse("Sr(Ti)")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conflicting keys 'Sr' and 'Ti' act on the same index."
        );
    }

    #[test]
    fn test_unknown_key_suggests_alternative() {
        let data = squares();
        let maps = Maps::new().with(0, AxisMap::from_iter([("foo", 0usize), ("baz", 1)]));
        let selector = Selector::new(maps, data.view()).unwrap();

        let err = selector.get(&key("bar")).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("\"bar\""));
        assert!(text.contains("Did you mean \"baz\"? "));
        assert!(text.contains("Valid choices are: foo, baz."));

        let maps = Maps::new().with(0, AxisMap::from_iter([("bar", 0usize), ("baz", 1)]));
        let selector = Selector::new(maps, data.view()).unwrap();
        let text = selector.get(&key("foo")).unwrap_err().to_string();
        assert!(!text.contains("Did you mean"));
    }

    #[test]
    fn test_ambiguous_keys_are_rejected() {
        let data = forces();
        let maps = Maps::new()
            .with(1, AxisMap::from_iter([("x", 0usize)]))
            .with(2, AxisMap::from_iter([("x", 0usize)]));
        let err = Selector::new(maps, data.view()).unwrap_err();
        assert_eq!(
            err,
            SelectionError::AmbiguousKey {
                key: "x".to_string(),
                axes: vec![1, 2]
            }
        );
    }

    #[test]
    fn test_number_labels() {
        let data = forces();
        let options = SelectorOptions {
            use_number_labels: true,
            ..Default::default()
        };
        let selector = Selector::with_options(structure_maps(), data.view(), options).unwrap();
        assert_eq!(selector.label(&parse("2(x)")).unwrap(), "Sr_2_x");
        assert_eq!(selector.label(&parse("4")).unwrap(), "O_1");
        assert_eq!(selector.label(&parse("1:2")).unwrap(), "1:2");

        let plain = Selector::new(structure_maps(), data.view()).unwrap();
        assert_eq!(plain.label(&parse("2(x)")).unwrap(), "2_x");
    }

    #[test]
    fn test_average_reduction_is_explicit() {
        let data = squares();
        let maps = Maps::new().with(0, AxisMap::from_iter([("A", IndexSpec::from(vec![1, 3]))]));
        let options = SelectorOptions {
            reduction: Reduction::Average,
            ..Default::default()
        };
        let average = Selector::with_options(maps.clone(), data.view(), options).unwrap();
        assert_eq!(scalar(&average.get(&key("A")).unwrap()), 5.0);
        let sum = Selector::new(maps, data.view()).unwrap();
        assert_eq!(scalar(&sum.get(&key("A")).unwrap()), 10.0);
    }

    #[test]
    fn test_weight_commutes_with_summation() {
        let data = forces();
        let weight = 0.25;
        let scaled = data.mapv(|v| v * weight);
        let plain = Selector::new(structure_maps(), data.view()).unwrap();
        let weighted = Selector::new(structure_maps(), scaled.view()).unwrap();
        let selection = parse("O(y)");
        let after = plain.get(&selection).unwrap() * weight;
        let before = weighted.get(&selection).unwrap();
        for (a, b) in after.iter().zip(before.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_repeated_evaluation_is_bit_identical() {
        let data = Array::from_shape_fn(IxDyn(&[4, 6, 3]), |i| {
            ((i[0] * 7 + i[1] * 3 + i[2]) as f64).sin()
        });
        let selection = parse("O(x) + Sr(z)");
        let first = Selector::new(structure_maps(), data.view())
            .unwrap()
            .get(&selection)
            .unwrap();
        let second = Selector::new(structure_maps(), data.view())
            .unwrap()
            .get(&selection)
            .unwrap();
        let bits = |a: &ArrayD<f64>| a.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_evaluate_preserves_order() {
        let data = forces();
        let selector = Selector::new(structure_maps(), data.view()).unwrap();
        let selections: Vec<Selection> = Tree::from_selection("O Sr(x) Ti z")
            .unwrap()
            .selections()
            .unwrap()
            .collect();
        let results = selector.evaluate(&selections).unwrap();
        let labels: Vec<&str> = results.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["O", "Sr_x", "Ti", "z"]);
        assert_eq!(results[1].1, selector.get(&selections[1]).unwrap());
    }

    #[test]
    fn test_out_of_bounds_index_is_not_a_user_error() {
        let data = squares();
        let maps = Maps::new().with(0, AxisMap::from_iter([("far", 42usize)]));
        let selector = Selector::new(maps, data.view()).unwrap();
        let err = selector.get(&key("far")).unwrap_err();
        assert_eq!(
            err,
            SelectionError::ShapeMismatch {
                axis: 0,
                index: 42,
                len: 10
            }
        );
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_map_for_missing_axis() {
        let data = squares();
        let maps = Maps::new().with(3, AxisMap::from_iter([("x", 0usize)]));
        let err = Selector::new(maps, data.view()).unwrap_err();
        assert!(matches!(err, SelectionError::Internal(_)));
    }
}
