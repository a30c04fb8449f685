//! # 原子与轨道投影
//!
//! 投影量（如投影 DOS）的数组前三维依次为自旋、原子、轨道。
//! [`Projector`] 为这三维构建标签映射，并用 [`Selector`] 解析用户选择：
//!
//! - **原子**: 元素名（`Sr`）或从 1 开始的编号（`1`），编号支持范围 `1:3`
//! - **轨道**: 轨道名（`s`, `px`, `dxy`），存在 `px` 时另有 `p`, `d`, `f` 汇总
//! - **自旋**: 由自旋分量数决定，1 -> `total`；2 -> `total`, `up`, `down`；
//!   4 -> `total`, `sigma_x|y|z`, `x|y|z`, `sigma_1|2|3`
//!
//! 未指定自旋时，共线计算分别给出 `up` 和 `down` 两项，
//! 非共线计算取 `total` 且标签中省略它。
//!
//! ## 依赖关系
//! - 使用 `index/`, `select/`, `models/`
//! - 被 `refinery/dos.rs` 和 `commands/` 使用

use super::{Dict, Refinery};
use crate::error::{QrefineError, Result, SelectionError};
use crate::index::{AxisMap, IndexSpec, Maps, Selector, SelectorOptions, Slice};
use crate::models::Stoichiometry;
use crate::raw::{self, RawSource};
use crate::select::{self, Part, Selection, Tree};

use ndarray::{ArrayD, ArrayViewD};

const SPIN_AXIS: usize = 0;
const ATOM_AXIS: usize = 1;
const ORBITAL_AXIS: usize = 2;

const SPIN_KEYS: [&str; 12] = [
    "total", "up", "down", "sigma_x", "sigma_y", "sigma_z", "x", "y", "z", "sigma_1", "sigma_2",
    "sigma_3",
];
const ANGULAR_MOMENTA: [&str; 4] = ["s", "p", "d", "f"];

/// 自旋、原子、轨道的投影映射
#[derive(Debug, Clone)]
pub struct Projector {
    stoichiometry: Stoichiometry,
    orbitals: Option<Vec<String>>,
    spin_components: usize,
}

impl Projector {
    pub fn new(
        stoichiometry: Stoichiometry,
        orbitals: Option<Vec<String>>,
        spin_components: usize,
    ) -> Result<Self> {
        if !matches!(spin_components, 1 | 2 | 4) {
            return Err(QrefineError::InvalidArgument(format!(
                "The number of spin components must be 1, 2, or 4, found {}.",
                spin_components
            )));
        }
        let orbitals = orbitals.map(|orbitals| {
            orbitals
                .into_iter()
                .map(|orbital| match orbital.trim() {
                    "x2-y2" => "dx2y2".to_string(),
                    other => other.to_string(),
                })
                .collect()
        });
        Ok(Projector {
            stoichiometry,
            orbitals,
            spin_components,
        })
    }

    /// 从数据源读取拓扑和轨道；自旋分量数取自投影或总 DOS 的第 0 维
    pub fn from_source(source: &dyn RawSource) -> Result<Self> {
        let spin_components = [raw::PROJECTIONS, raw::DOS]
            .into_iter()
            .find(|name| source.has(name))
            .map(|name| source.array(name))
            .transpose()?
            .and_then(|array| array.shape().first().copied())
            .unwrap_or(1);
        Self::from_topology(source, spin_components)
    }

    /// 自旋分量数已知时只读取结构和轨道，不读取数组
    pub fn from_topology(source: &dyn RawSource, spin_components: usize) -> Result<Self> {
        let stoichiometry = source.structure()?.stoichiometry;
        let orbitals = source.orbital_types()?;
        Self::new(stoichiometry, orbitals, spin_components)
    }

    pub fn is_collinear(&self) -> bool {
        self.spin_components == 2
    }

    pub fn is_noncollinear(&self) -> bool {
        self.spin_components == 4
    }

    pub fn has_orbitals(&self) -> bool {
        self.orbitals.is_some()
    }

    pub fn stoichiometry(&self) -> &Stoichiometry {
        &self.stoichiometry
    }

    pub fn atom_map(&self) -> AxisMap {
        self.stoichiometry.atom_map()
    }

    pub fn orbital_map(&self) -> AxisMap {
        let orbitals = self.orbitals.as_deref().unwrap_or_default();
        let mut map: AxisMap = orbitals
            .iter()
            .enumerate()
            .map(|(i, orbital)| (orbital.as_str(), i..i + 1))
            .collect();
        if orbitals.iter().any(|orbital| orbital == "px") {
            map.insert("p", Slice::new(1, 4));
            map.insert("d", Slice::new(4, 9));
            map.insert("f", Slice::new(9, 16));
        }
        map
    }

    pub fn spin_map(&self) -> AxisMap {
        let component = |i: usize| IndexSpec::from(i..i + 1);
        match self.spin_components {
            1 => AxisMap::from_iter([("total", component(0))]),
            2 => AxisMap::from_iter([
                ("total", IndexSpec::from(0..2)),
                ("up", component(0)),
                ("down", component(1)),
            ]),
            _ => {
                let mut map = AxisMap::from_iter([("total", component(0))]);
                for prefix in ["sigma_", ""] {
                    for (i, direction) in ["x", "y", "z"].into_iter().enumerate() {
                        map.insert(format!("{}{}", prefix, direction), component(i + 1));
                    }
                }
                for i in 1..=3 {
                    map.insert(format!("sigma_{}", i), component(i));
                }
                map
            }
        }
    }

    /// 轴顺序决定标签顺序：原子、轨道、自旋
    fn maps(&self) -> Maps {
        Maps::new()
            .with(ATOM_AXIS, self.atom_map())
            .with(ORBITAL_AXIS, self.orbital_map())
            .with(SPIN_AXIS, self.spin_map())
    }

    /// 选择投影数组的一部分并附上标签
    ///
    /// `projections` 的前三维依次为自旋、原子、轨道，剩余维度原样保留。
    /// 空选择返回空列表。
    pub fn project(
        &self,
        selection: Option<&str>,
        projections: ArrayViewD<'_, f64>,
    ) -> Result<Vec<(String, ArrayD<f64>)>> {
        let Some(selection) = selection.filter(|s| !s.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        if !self.has_orbitals() {
            return Err(SelectionError::IncorrectUsage(
                "Projectors are not available, rerun VASP setting LORBIT >= 10.".to_string(),
            )
            .into());
        }
        let shape = projections.shape();
        let orbitals = self.orbitals.as_ref().map_or(0, Vec::len);
        if shape.len() < 3
            || shape[SPIN_AXIS] != self.spin_components
            || shape[ATOM_AXIS] != self.stoichiometry.number_atoms()
            || shape[ORBITAL_AXIS] < orbitals
        {
            return Err(SelectionError::IncorrectUsage(format!(
                "Error reading the projections with shape {:?}. Please make sure that the passed projections has the right format, i.e., the indices correspond to spin, atom, and orbital, respectively.",
                shape
            ))
            .into());
        }

        let options = SelectorOptions {
            use_number_labels: true,
            ..Default::default()
        };
        let selector = Selector::with_options(self.maps(), projections.view(), options)?;

        let tree = Tree::from_selection(selection)?;
        let mut result = Vec::new();
        for selection in tree.selections()? {
            for (selection, default_spin) in self.with_default_spin(selection) {
                let mut label = selector.label(&selection)?;
                if default_spin && self.is_noncollinear() {
                    label = label.replace("_total", "");
                }
                result.push((label, selector.get(&selection)?));
            }
        }
        Ok(result)
    }

    /// 未指定自旋时补上默认自旋；返回值标记是否补充了默认值
    fn with_default_spin(&self, selection: Selection) -> Vec<(Selection, bool)> {
        if self.spin_components == 1 || self.spin_selected(&selection) {
            return vec![(selection, false)];
        }
        let defaults: &[&str] = if self.is_collinear() {
            &["up", "down"]
        } else {
            &["total"]
        };
        defaults
            .iter()
            .map(|spin| {
                let mut extended = selection.clone();
                extended.push(Part::from(*spin));
                (extended, true)
            })
            .collect()
    }

    fn spin_selected(&self, selection: &[Part]) -> bool {
        self.spin_map()
            .keys()
            .any(|choice| select::contains(selection, choice, false))
    }
}

/// 与投影相关的排序：自旋键保持原顺序，轨道按角动量，编号按数值
fn sort_key(key: &str) -> (u8, usize, String) {
    if let Some(position) = SPIN_KEYS.iter().position(|k| *k == key) {
        return (0, position, String::new());
    }
    if let Ok(number) = key.parse::<usize>() {
        return (2, number, String::new());
    }
    let first = key.get(..1).unwrap_or_default();
    if let Some(l) = ANGULAR_MOMENTA.iter().position(|k| *k == first) {
        return (1, l, key.to_string());
    }
    (0, 0, String::new())
}

fn sorted_keys(map: &AxisMap) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().map(String::from).collect();
    keys.sort_by_cached_key(|key| sort_key(key));
    keys
}

impl Refinery for Projector {
    /// 每个映射的键及其索引，索引写为 `start:stop` 或逗号分隔的列表
    fn to_dict(&self) -> Result<Dict> {
        let mut dict = Dict::new();
        if !self.has_orbitals() {
            return Ok(dict);
        }
        for (name, map) in [
            ("atom", self.atom_map()),
            ("orbital", self.orbital_map()),
            ("spin", self.spin_map()),
        ] {
            for (key, spec) in map.iter() {
                dict.insert(format!("{}/{}", name, key), describe(spec));
            }
        }
        Ok(dict)
    }

    fn to_display(&self) -> Result<String> {
        let Some(orbitals) = &self.orbitals else {
            return Ok("no projectors".to_string());
        };
        Ok(format!(
            "projectors:\n    atoms: {}\n    orbitals: {}",
            self.stoichiometry.ion_types().join(", "),
            orbitals.join(", ")
        ))
    }

    fn selections(&self) -> Result<Vec<(String, Vec<String>)>> {
        if !self.has_orbitals() {
            return Ok(Vec::new());
        }
        Ok(vec![
            ("atom".to_string(), sorted_keys(&self.atom_map())),
            ("orbital".to_string(), sorted_keys(&self.orbital_map())),
            ("spin".to_string(), sorted_keys(&self.spin_map())),
        ])
    }
}

fn describe(spec: &IndexSpec) -> String {
    let bound = |b: Option<usize>| b.map(|b| b.to_string()).unwrap_or_default();
    match spec {
        IndexSpec::Single(index) => index.to_string(),
        IndexSpec::List(indices) => indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(","),
        IndexSpec::Slice(slice) => format!("{}:{}", bound(slice.start), bound(slice.stop)),
    }
}
