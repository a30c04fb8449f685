//! # 态密度 (DOS)
//!
//! 输出的字典总是以 `energies` 开头（已减去费米能，费米能位于 0），
//! 随后是总 DOS：自旋极化时为 `up` 和 `down`，否则为 `total`。
//! 给出选择时追加投影 DOS，最后是原始的 `fermi_energy`。
//!
//! ## 依赖关系
//! - 使用 `raw/` 的 `energies`, `dos`, `projections`, `fermi_energy`
//! - 使用 `refinery/projector.rs` 解析选择

use super::{Dict, Projector, Refinery};
use crate::error::{QrefineError, Result};
use crate::raw::{self, RawSource};

use ndarray::{ArrayD, Axis, Ix2};

/// 态密度
pub struct Dos<'a> {
    source: &'a dyn RawSource,
    selection: Option<String>,
    fermi_energy: Option<f64>,
}

impl<'a> Dos<'a> {
    pub fn new(source: &'a dyn RawSource) -> Self {
        Dos {
            source,
            selection: None,
            fermi_energy: None,
        }
    }

    /// 投影选择，例如 `"Sr(p) Ti(d)"`
    pub fn with_selection(mut self, selection: Option<&str>) -> Self {
        self.selection = selection.map(String::from);
        self
    }

    /// 覆盖数据源中的费米能
    pub fn with_fermi_energy(mut self, fermi_energy: Option<f64>) -> Self {
        self.fermi_energy = fermi_energy;
        self
    }

    pub fn fermi_energy(&self) -> Result<f64> {
        match self.fermi_energy {
            Some(value) => Ok(value),
            None => self.source.scalar(raw::FERMI_ENERGY),
        }
    }

    fn energies(&self) -> Result<ArrayD<f64>> {
        let energies = self.source.array(raw::ENERGIES)?;
        if energies.ndim() != 1 {
            return Err(shape_error(raw::ENERGIES, &energies, "[energy]"));
        }
        Ok(energies)
    }

    /// 总 DOS `[spin, energy]`
    fn total_dos(&self, points: usize) -> Result<ArrayD<f64>> {
        let dos = self.source.array(raw::DOS)?;
        let valid = dos
            .view()
            .into_dimensionality::<Ix2>()
            .map(|dos| matches!(dos.dim(), (1 | 2, n) if n == points))
            .unwrap_or(false);
        if !valid {
            return Err(shape_error(raw::DOS, &dos, "[spin (1 or 2), energy]"));
        }
        Ok(dos)
    }

    fn is_spin_polarized(&self) -> Result<bool> {
        let points = self.energies()?.len();
        Ok(self.total_dos(points)?.len_of(Axis(0)) == 2)
    }

    fn projector(&self) -> Result<Projector> {
        Projector::from_source(self.source)
    }

    /// 精炼结果，以及被投影标签覆盖的键（例如非自旋极化时的 `"total"`）
    pub fn refine(&self) -> Result<(Dict, Vec<String>)> {
        let fermi_energy = self.fermi_energy()?;
        let energies = self.energies()?;
        let dos = self.total_dos(energies.len())?;

        let mut dict = Dict::new();
        dict.insert(raw::ENERGIES, energies.mapv(|e| e - fermi_energy));
        if dos.len_of(Axis(0)) == 2 {
            dict.insert("up", dos.index_axis(Axis(0), 0).to_owned());
            dict.insert("down", dos.index_axis(Axis(0), 1).to_owned());
        } else {
            dict.insert("total", dos.index_axis(Axis(0), 0).to_owned());
        }

        let mut replaced = Vec::new();
        if self.selection.is_some() {
            let projections = self.source.array(raw::PROJECTIONS)?;
            let spins = projections.shape().first().copied().unwrap_or(1);
            let projected = Projector::from_topology(self.source, spins)?
                .project(self.selection.as_deref(), projections.view())?;
            for (label, values) in projected {
                if values.ndim() != 1 {
                    return Err(shape_error(
                        raw::PROJECTIONS,
                        &projections,
                        "[spin, atom, orbital, energy]",
                    ));
                }
                if dict.insert(label.as_str(), values).is_some() {
                    replaced.push(label);
                }
            }
        }

        dict.insert(raw::FERMI_ENERGY, fermi_energy);
        Ok((dict, replaced))
    }
}

fn shape_error(name: &str, array: &ArrayD<f64>, expected: &str) -> QrefineError {
    QrefineError::InvalidShape {
        name: name.to_string(),
        shape: array.shape().to_vec(),
        expected: expected.to_string(),
    }
}

impl Refinery for Dos<'_> {
    fn to_dict(&self) -> Result<Dict> {
        self.refine().map(|(dict, _)| dict)
    }

    fn to_display(&self) -> Result<String> {
        let energies = self.energies()?;
        let (first, last) = match (energies.iter().next(), energies.iter().last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(QrefineError::NoData("The energy mesh is empty.".to_string())),
        };
        let polarized = if self.is_spin_polarized()? {
            "spin polarized "
        } else {
            ""
        };
        let projector = match self.projector() {
            Ok(projector) => projector.to_display()?,
            Err(_) => "no projectors".to_string(),
        };
        Ok(format!(
            "{}Dos:\n    energies: [{:.2}, {:.2}] {} points\n{}",
            polarized,
            first,
            last,
            energies.len(),
            projector
        ))
    }

    fn selections(&self) -> Result<Vec<(String, Vec<String>)>> {
        self.projector()?.selections()
    }
}

/// 绘图时向下的自旋分量取负值
pub fn flip_down_component(label: &str) -> bool {
    label.contains("down") && !label.contains("up") && !label.contains("total")
}
