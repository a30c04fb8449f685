//! # VASP POSCAR 格式解析器
//!
//! 读取原子拓扑：元素行与数量行决定原子维度的映射。
//!
//! ## POSCAR 格式说明
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ...
//! ```
//!
//! 缺少元素行的 VASP 4 文件无法区分元素，视为解析错误。
//!
//! ## 依赖关系
//! - 被 `raw/` 使用
//! - 使用 `models/structure.rs`

use crate::error::{QrefineError, Result};
use crate::models::{Lattice, Stoichiometry, Structure};
use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Structure> {
    let content = fs::read_to_string(path).map_err(|e| QrefineError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_poscar_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 POSCAR 格式
pub fn parse_poscar_content(content: &str, source: &str) -> Result<Structure> {
    let lines: Vec<&str> = content.lines().collect();
    let fail = |reason: String| QrefineError::ParseError {
        format: "poscar".to_string(),
        path: source.to_string(),
        reason,
    };

    if lines.len() < 8 {
        return Err(fail("File too short".to_string()));
    }

    let name = lines[0].trim().to_string();

    let scale: f64 = lines[1]
        .trim()
        .parse()
        .map_err(|_| fail(format!("Invalid scaling factor '{}'", lines[1].trim())))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts: Vec<f64> = lines[2 + i]
            .split_whitespace()
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            return Err(fail(format!("Invalid lattice vector at line {}", 3 + i)));
        }
        *row = [parts[0] * scale, parts[1] * scale, parts[2] * scale];
    }
    let lattice = Lattice::from_vectors(matrix);

    // Line 5: 元素符号
    let ion_types: Vec<String> = lines[5].split_whitespace().map(String::from).collect();
    if ion_types.is_empty() || ion_types[0].parse::<usize>().is_ok() {
        return Err(fail(
            "Missing element symbols (VASP 4 format is not supported)".to_string(),
        ));
    }

    // Line 6: 数量
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|s| s.parse())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| fail(format!("Invalid atom counts '{}'", lines[6].trim())))?;
    if counts.len() != ion_types.len() {
        return Err(fail(format!(
            "{} element symbols but {} atom counts",
            ion_types.len(),
            counts.len()
        )));
    }
    let stoichiometry = Stoichiometry::new(ion_types, counts);

    let mut coord_line = 7;
    if lines[coord_line]
        .trim()
        .to_lowercase()
        .starts_with("selective")
    {
        coord_line += 1;
    }
    let Some(coord_type) = lines.get(coord_line) else {
        return Err(fail("Missing coordinate type line".to_string()));
    };
    let coord_type = coord_type.trim().to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let number_atoms = stoichiometry.number_atoms();
    let mut positions = Vec::with_capacity(number_atoms);
    for line in lines.iter().skip(coord_line + 1).take(number_atoms) {
        let parts: Vec<f64> = line
            .split_whitespace()
            .take(3)
            .filter_map(|s| s.parse().ok())
            .collect();
        if parts.len() < 3 {
            break;
        }
        let position = [parts[0], parts[1], parts[2]];
        positions.push(if is_cartesian {
            cart_to_frac(position.map(|x| x * scale), &lattice)
        } else {
            position
        });
    }
    if positions.len() != number_atoms {
        return Err(fail(format!(
            "Expected {} atom positions, found {}",
            number_atoms,
            positions.len()
        )));
    }

    Ok(Structure {
        name,
        lattice,
        stoichiometry,
        positions,
    })
}

/// 笛卡尔坐标转分数坐标
fn cart_to_frac(cart: [f64; 3], lattice: &Lattice) -> [f64; 3] {
    let m = lattice.matrix;
    let det = lattice.volume();

    if det.abs() < 1e-10 {
        return cart;
    }

    let inv = [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ];

    // 行向量约定：frac = cart · M⁻¹
    [
        cart[0] * inv[0][0] + cart[1] * inv[1][0] + cart[2] * inv[2][0],
        cart[0] * inv[0][1] + cart[1] * inv[1][1] + cart[2] * inv[2][1],
        cart[0] * inv[0][2] + cart[1] * inv[1][2] + cart[2] * inv[2][2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRTIO3: &str = r#"SrTiO3
1.0
3.9 0.0 0.0
0.0 3.9 0.0
0.0 0.0 3.9
Sr Ti O
1 1 3
Direct
0.0 0.0 0.0
0.5 0.5 0.5
0.5 0.5 0.0
0.5 0.0 0.5
0.0 0.5 0.5
"#;

    #[test]
    fn test_parse_poscar_vasp5() {
        let structure = parse_poscar_content(SRTIO3, "POSCAR").unwrap();
        assert_eq!(structure.name, "SrTiO3");
        assert_eq!(structure.number_atoms(), 5);
        assert_eq!(structure.stoichiometry.ion_types, vec!["Sr", "Ti", "O"]);
        assert_eq!(structure.stoichiometry.counts, vec![1, 1, 3]);
        assert_eq!(structure.positions[1], [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_parse_poscar_with_scale() {
        let content = SRTIO3.replacen("1.0", "2.0", 1);
        let structure = parse_poscar_content(&content, "POSCAR").unwrap();
        assert!((structure.lattice.lengths()[0] - 7.8).abs() < 1e-9);
    }

    #[test]
    fn test_parse_poscar_cartesian() {
        let content = r#"Fe
1.0
2.0 0.0 0.0
0.0 2.0 0.0
0.0 0.0 2.0
Fe
2
Cartesian
0.0 0.0 0.0
1.0 1.0 1.0
"#;
        let structure = parse_poscar_content(content, "POSCAR").unwrap();
        for x in structure.positions[1] {
            assert!((x - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parse_poscar_selective_dynamics() {
        let content = r#"Fe with selective
1.0
2.87 0.0 0.0
0.0 2.87 0.0
0.0 0.0 2.87
Fe
2
Selective dynamics
Direct
0.0 0.0 0.0 T T T
0.5 0.5 0.5 F F F
"#;
        let structure = parse_poscar_content(content, "POSCAR").unwrap();
        assert_eq!(structure.number_atoms(), 2);
    }

    #[test]
    fn test_vasp4_poscar_is_rejected() {
        let content = r#"old
1.0
1.0 0.0 0.0
0.0 1.0 0.0
0.0 0.0 1.0
2
Direct
0.0 0.0 0.0
0.5 0.5 0.5
"#;
        let err = parse_poscar_content(content, "POSCAR").unwrap_err();
        assert!(err.to_string().contains("VASP 4"));
    }

    #[test]
    fn test_missing_positions() {
        let truncated: String = SRTIO3.lines().take(11).collect::<Vec<_>>().join("\n");
        let err = parse_poscar_content(&truncated, "POSCAR").unwrap_err();
        assert!(err.to_string().contains("Expected 5 atom positions"));
    }
}
