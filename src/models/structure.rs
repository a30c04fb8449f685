//! # 晶体结构与化学计量
//!
//! 投影需要知道每个原子属于哪种元素。[`Stoichiometry`] 保存 POSCAR 中的
//! 元素行与数量行，并生成原子维度的标签映射：
//!
//! - 元素名 -> 该元素所有原子的索引（同一元素出现在多处时为非连续列表）
//! - `"1"`, `"2"`, ... -> 单个原子（从 1 开始编号）
//!
//! ## 依赖关系
//! - 被 `parsers/poscar.rs` 和 `refinery/` 使用
//! - 使用 `index/` 的 `AxisMap`, `IndexSpec`

use crate::index::{AxisMap, IndexSpec};
use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 晶格向量长度 (a, b, c)
    pub fn lengths(&self) -> [f64; 3] {
        self.matrix
            .map(|v| (v[0].powi(2) + v[1].powi(2) + v[2].powi(2)).sqrt())
    }

    /// 晶格体积（带符号）
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }
}

/// 元素种类与数量，顺序与 POSCAR 一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stoichiometry {
    pub ion_types: Vec<String>,
    pub counts: Vec<usize>,
}

impl Stoichiometry {
    pub fn new(ion_types: Vec<String>, counts: Vec<usize>) -> Self {
        Stoichiometry { ion_types, counts }
    }

    pub fn number_atoms(&self) -> usize {
        self.counts.iter().sum()
    }

    /// 每个原子的元素
    pub fn elements(&self) -> Vec<&str> {
        self.ion_types
            .iter()
            .zip(&self.counts)
            .flat_map(|(ion, &count)| std::iter::repeat(ion.as_str()).take(count))
            .collect()
    }

    /// 不重复的元素，按首次出现的顺序
    pub fn ion_types(&self) -> Vec<&str> {
        let mut unique: Vec<&str> = Vec::new();
        for ion in &self.ion_types {
            if !unique.contains(&ion.as_str()) {
                unique.push(ion);
            }
        }
        unique
    }

    /// 每个原子的唯一名称，如 `Sr_1`, `O_3`
    pub fn names(&self) -> Vec<String> {
        let mut seen: Vec<(&str, usize)> = Vec::new();
        self.elements()
            .into_iter()
            .map(|element| {
                let number = match seen.iter_mut().find(|(e, _)| *e == element) {
                    Some(entry) => {
                        entry.1 += 1;
                        entry.1
                    }
                    None => {
                        seen.push((element, 1));
                        1
                    }
                };
                format!("{}_{}", element, number)
            })
            .collect()
    }

    /// 化学式，如 `Sr2TiO4`（同一元素的多段数量合并）
    pub fn formula(&self) -> String {
        let mut totals: Vec<(&str, usize)> = Vec::new();
        for (ion, &count) in self.ion_types.iter().zip(&self.counts) {
            let ion = ion.as_str();
            match totals.iter_mut().find(|(e, _)| *e == ion) {
                Some(entry) => entry.1 += count,
                None => totals.push((ion, count)),
            }
        }
        totals
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect()
    }

    /// 原子维度的映射：元素在前，编号在后
    ///
    /// 连续的索引合并为切片，否则使用列表。
    pub fn atom_map(&self) -> AxisMap {
        let mut by_element: Vec<(&str, Vec<usize>)> = Vec::new();
        for (index, element) in self.elements().into_iter().enumerate() {
            match by_element.iter_mut().find(|(e, _)| *e == element) {
                Some(entry) => entry.1.push(index),
                None => by_element.push((element, vec![index])),
            }
        }

        let mut map = AxisMap::new();
        for (element, indices) in by_element {
            map.insert(element, merge_to_slice(indices));
        }
        for index in 0..self.number_atoms() {
            map.insert((index + 1).to_string(), index..index + 1);
        }
        map
    }
}

fn merge_to_slice(indices: Vec<usize>) -> IndexSpec {
    match (indices.first(), indices.last()) {
        (Some(&first), Some(&last)) if last + 1 - first == indices.len() => {
            IndexSpec::from(first..last + 1)
        }
        _ => IndexSpec::List(indices),
    }
}

/// 晶体结构：名称、晶格、化学计量和分数坐标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    pub lattice: Lattice,
    pub stoichiometry: Stoichiometry,
    pub positions: Vec<[f64; 3]>,
}

impl Structure {
    pub fn number_atoms(&self) -> usize {
        self.stoichiometry.number_atoms()
    }

    /// 笛卡尔坐标 (Å)
    pub fn cartesian_positions(&self) -> Vec<[f64; 3]> {
        let m = self.lattice.matrix;
        self.positions
            .iter()
            .map(|f| {
                [0, 1, 2].map(|k| f[0] * m[0][k] + f[1] * m[1][k] + f[2] * m[2][k])
            })
            .collect()
    }

    /// 每原子体积 (Å³)
    pub fn volume_per_atom(&self) -> Option<f64> {
        let atoms = self.number_atoms();
        (atoms > 0).then(|| self.lattice.volume().abs() / atoms as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strontium_titanate() -> Stoichiometry {
        Stoichiometry::new(
            vec!["Sr".into(), "Ti".into(), "O".into()],
            vec![2, 1, 3],
        )
    }

    #[test]
    fn test_lattice_volume_cubic() {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        assert!((lattice.volume().abs() - 125.0).abs() < 1e-6);
        assert!((lattice.lengths()[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_cartesian_positions() {
        let structure = Structure {
            name: "Fe".to_string(),
            lattice: Lattice::from_vectors([[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 4.0]]),
            stoichiometry: Stoichiometry::new(vec!["Fe".into()], vec![1]),
            positions: vec![[0.5, 0.25, 0.5]],
        };
        assert_eq!(structure.cartesian_positions(), vec![[1.0, 0.5, 2.0]]);
        assert!((structure.volume_per_atom().unwrap() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_names_and_formula() {
        let stoichiometry = strontium_titanate();
        assert_eq!(stoichiometry.number_atoms(), 6);
        assert_eq!(
            stoichiometry.names(),
            vec!["Sr_1", "Sr_2", "Ti_1", "O_1", "O_2", "O_3"]
        );
        assert_eq!(stoichiometry.formula(), "Sr2TiO3");
    }

    #[test]
    fn test_atom_map_uses_slices_when_contiguous() {
        let map = strontium_titanate().atom_map();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["Sr", "Ti", "O", "1", "2", "3", "4", "5", "6"]);
        assert_eq!(map.get("Sr"), Some(&IndexSpec::from(0..2)));
        assert_eq!(map.get("O"), Some(&IndexSpec::from(3..6)));
        assert_eq!(map.get("4"), Some(&IndexSpec::from(3..4)));
    }

    #[test]
    fn test_repeated_ion_type_gives_index_list() {
        let stoichiometry = Stoichiometry::new(
            vec!["Sr".into(), "O".into(), "Sr".into()],
            vec![1, 2, 1],
        );
        let map = stoichiometry.atom_map();
        assert_eq!(map.get("Sr"), Some(&IndexSpec::List(vec![0, 3])));
        assert_eq!(stoichiometry.ion_types(), vec!["Sr", "O"]);
        assert_eq!(stoichiometry.formula(), "Sr2O2");
        assert_eq!(stoichiometry.names()[3], "Sr_2");
    }
}
