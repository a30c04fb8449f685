//! # 原子受力
//!
//! 力轨迹 `[step, atom, direction]`。[`Steps`] 决定读取哪些步，
//! 选择（如 `"Sr(x)"`, `"O - Ti"`）按原子和方向投影。
//!
//! ## 依赖关系
//! - 使用 `raw/` 的 `forces` 和结构
//! - 使用 `index/` 解析选择

use super::{Dict, Refinery, Steps};
use crate::error::{QrefineError, Result};
use crate::index::{AxisMap, Maps, Reduction, Selector, SelectorOptions};
use crate::models::Structure;
use crate::raw::{self, RawSource};
use crate::select::Tree;

use ndarray::{ArrayD, Axis, Ix3};

const DIRECTIONS: [&str; 3] = ["x", "y", "z"];

/// 力轨迹
pub struct Force<'a> {
    source: &'a dyn RawSource,
    steps: Steps,
    selection: Option<String>,
    reduction: Reduction,
}

impl<'a> Force<'a> {
    pub fn new(source: &'a dyn RawSource) -> Self {
        Force {
            source,
            steps: Steps::default(),
            selection: None,
            reduction: Reduction::Sum,
        }
    }

    pub fn with_steps(mut self, steps: Steps) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_selection(mut self, selection: Option<&str>) -> Self {
        self.selection = selection.map(String::from);
        self
    }

    /// 选中多个原子或方向时的约化方式
    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    fn direction_map() -> AxisMap {
        DIRECTIONS.iter().enumerate().map(|(i, d)| (*d, i)).collect()
    }

    /// 读取并校验力和结构
    fn read(&self) -> Result<(ArrayD<f64>, Structure)> {
        let structure = self.source.structure()?;
        let forces = self.source.array(raw::FORCES)?;
        let valid = forces
            .view()
            .into_dimensionality::<Ix3>()
            .map(|f| {
                let (_, atoms, directions) = f.dim();
                atoms == structure.number_atoms() && directions == 3
            })
            .unwrap_or(false);
        if !valid {
            return Err(QrefineError::InvalidShape {
                name: raw::FORCES.to_string(),
                shape: forces.shape().to_vec(),
                expected: format!("[step, {}, 3]", structure.number_atoms()),
            });
        }
        Ok((forces, structure))
    }

    /// 按选择投影选中的步；单步结果为标量，多步结果每步一个值
    fn project(
        &self,
        forces: &ArrayD<f64>,
        structure: &Structure,
    ) -> Result<Vec<(String, ArrayD<f64>)>> {
        let Some(selection) = self.selection.as_deref() else {
            return Ok(Vec::new());
        };
        let offset = if self.steps.is_single() { 0 } else { 1 };
        let maps = Maps::new()
            .with(offset, structure.stoichiometry.atom_map())
            .with(offset + 1, Self::direction_map());
        let options = SelectorOptions {
            use_number_labels: true,
            reduction: self.reduction,
        };
        let selector = Selector::with_options(maps, forces.view(), options)?;
        let selections: Vec<_> = Tree::from_selection(selection)?.selections()?.collect();
        Ok(selector.evaluate(&selections)?)
    }
}

impl Refinery for Force<'_> {
    fn to_dict(&self) -> Result<Dict> {
        let (forces, structure) = self.read()?;
        let forces = self.steps.select(forces.view())?;

        let projected = self.project(&forces, &structure)?;

        let mut dict = Dict::new();
        dict.insert("formula", structure.stoichiometry.formula());
        dict.insert(raw::FORCES, forces);
        dict.extend(projected);
        Ok(dict)
    }

    /// 与 OUTCAR 相似的格式，显示选中的最后一步
    fn to_display(&self) -> Result<String> {
        let (forces, structure) = self.read()?;
        let step = self.steps.last_index(forces.len_of(Axis(0)))?;
        let forces = forces.index_axis(Axis(0), step);

        let mut result = String::from(
            "POSITION                                       TOTAL-FORCE (eV/Angst)\n\
             -----------------------------------------------------------------------------------",
        );
        for (position, force) in structure
            .cartesian_positions()
            .iter()
            .zip(forces.outer_iter())
        {
            let position: Vec<String> = position.iter().map(|x| format!("{:12.5}", x)).collect();
            let force: Vec<String> = force.iter().map(|x| format!("{:13.6}", x)).collect();
            result.push_str(&format!("\n{}    {}", position.join(" "), force.join(" ")));
        }
        Ok(result)
    }

    fn selections(&self) -> Result<Vec<(String, Vec<String>)>> {
        let structure = self.source.structure()?;
        Ok(vec![
            (
                "atom".to_string(),
                structure.stoichiometry.atom_map().keys().map(String::from).collect(),
            ),
            (
                "direction".to_string(),
                DIRECTIONS.iter().map(|d| d.to_string()).collect(),
            ),
        ])
    }
}
