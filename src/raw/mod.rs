//! # 原始数据源
//!
//! 精炼层从 [`RawSource`] 读取数组，不关心数据来自文件还是内存。
//!
//! - [`NpyDirectory`]: 计算目录，每个数组存为 `<dir>/<name>.npy`，
//!   结构来自 `<dir>/POSCAR`，轨道名称来自 `<dir>/orbitals.txt`
//! - [`MemorySource`]: 内存中的数组，用于组合数据或测试
//! - [`WithOrbitals`]: 覆盖另一个数据源的轨道名称
//!
//! ## 依赖关系
//! - 被 `refinery/` 和 `commands/` 使用
//! - 使用 `parsers/` 读取结构
//! - 使用 `ndarray-npy` 读取 `.npy` 文件

use crate::error::{QrefineError, Result};
use crate::models::Structure;
use crate::parsers;

use ndarray::ArrayD;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 能量网格
pub const ENERGIES: &str = "energies";
/// 总 DOS `[spin, energy]`
pub const DOS: &str = "dos";
/// 投影 DOS `[spin, atom, orbital, energy]`
pub const PROJECTIONS: &str = "projections";
/// 力 `[step, atom, direction]`
pub const FORCES: &str = "forces";
/// 费米能（标量或单元素数组）
pub const FERMI_ENERGY: &str = "fermi_energy";

/// 原始数据的读取接口
pub trait RawSource: Sync {
    /// 读取指定名称的数组
    fn array(&self, name: &str) -> Result<ArrayD<f64>>;

    fn has(&self, name: &str) -> bool;

    /// 晶体结构（原子拓扑）
    fn structure(&self) -> Result<Structure>;

    /// 投影使用的轨道名称；未写出投影时为 `None`
    fn orbital_types(&self) -> Result<Option<Vec<String>>>;

    /// 读取只含一个元素的数组
    fn scalar(&self, name: &str) -> Result<f64> {
        let array = self.array(name)?;
        match array.len() {
            1 => Ok(array.iter().copied().sum()),
            _ => Err(QrefineError::InvalidShape {
                name: name.to_string(),
                shape: array.shape().to_vec(),
                expected: "a single value".to_string(),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// .npy 目录
// ─────────────────────────────────────────────────────────────

/// 存放 `.npy` 数组的计算目录
#[derive(Debug, Clone)]
pub struct NpyDirectory {
    root: PathBuf,
}

impl NpyDirectory {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(QrefineError::DirectoryNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(NpyDirectory { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.npy", name))
    }
}

impl RawSource for NpyDirectory {
    fn array(&self, name: &str) -> Result<ArrayD<f64>> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(QrefineError::NoData(format!(
                "No '{}' data found, expected the file '{}'.",
                name,
                path.display()
            )));
        }
        ndarray_npy::read_npy(&path).map_err(|source| QrefineError::NpyReadError {
            name: name.to_string(),
            path: path.display().to_string(),
            source,
        })
    }

    fn has(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn structure(&self) -> Result<Structure> {
        parsers::find_structure_file(&self.root)
    }

    fn orbital_types(&self) -> Result<Option<Vec<String>>> {
        let path = self.root.join("orbitals.txt");
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| QrefineError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Some(content.split_whitespace().map(String::from).collect()))
    }
}

// ─────────────────────────────────────────────────────────────
// 内存数据
// ─────────────────────────────────────────────────────────────

/// 内存中的原始数据
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    arrays: HashMap<String, ArrayD<f64>>,
    structure: Option<Structure>,
    orbitals: Option<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_array(mut self, name: &str, array: ArrayD<f64>) -> Self {
        self.arrays.insert(name.to_string(), array);
        self
    }

    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structure = Some(structure);
        self
    }

    pub fn with_orbitals<S: Into<String>>(mut self, orbitals: impl IntoIterator<Item = S>) -> Self {
        self.orbitals = Some(orbitals.into_iter().map(Into::into).collect());
        self
    }
}

impl RawSource for MemorySource {
    fn array(&self, name: &str) -> Result<ArrayD<f64>> {
        self.arrays
            .get(name)
            .cloned()
            .ok_or_else(|| QrefineError::NoData(format!("No '{}' data found.", name)))
    }

    fn has(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    fn structure(&self) -> Result<Structure> {
        self.structure
            .clone()
            .ok_or_else(|| QrefineError::NoData("No structure data found.".to_string()))
    }

    fn orbital_types(&self) -> Result<Option<Vec<String>>> {
        Ok(self.orbitals.clone())
    }
}

// ─────────────────────────────────────────────────────────────
// 轨道覆盖
// ─────────────────────────────────────────────────────────────

/// 用给定的轨道名称代替数据源中的轨道，其余数据照常读取
pub struct WithOrbitals<'a> {
    inner: &'a dyn RawSource,
    orbitals: Vec<String>,
}

impl<'a> WithOrbitals<'a> {
    pub fn new(inner: &'a dyn RawSource, orbitals: Vec<String>) -> Self {
        WithOrbitals { inner, orbitals }
    }
}

impl RawSource for WithOrbitals<'_> {
    fn array(&self, name: &str) -> Result<ArrayD<f64>> {
        self.inner.array(name)
    }

    fn has(&self, name: &str) -> bool {
        self.inner.has(name)
    }

    fn structure(&self) -> Result<Structure> {
        self.inner.structure()
    }

    fn orbital_types(&self) -> Result<Option<Vec<String>>> {
        Ok(Some(self.orbitals.clone()))
    }
}
