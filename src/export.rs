//! # 数据导出
//!
//! 把精炼后的字典写成 CSV。
//!
//! ## 支持格式
//! - 列格式：字典中所有等长的一维数组各占一列（如 DOS 的 energies, total, Sr_p）
//! - 标签格式：零维结果（如单步的力投影）和标量写成 `label,value` 两列
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `refinery::Dict`
//! - 使用 `csv` 和 `serde` 写入文件

use crate::error::{QrefineError, Result};
use crate::refinery::{Dict, Value};

use serde::Serialize;
use std::path::Path;

/// 标签格式中的一行
#[derive(Debug, Serialize)]
struct LabeledValue<'a> {
    label: &'a str,
    value: f64,
}

/// 导出字典为 CSV，自动选择列格式或标签格式
pub fn dict_to_csv(dict: &Dict, output_path: &Path) -> Result<()> {
    if dict.series().next().is_some() {
        series_to_csv(dict, output_path)
    } else {
        values_to_csv(dict, output_path)
    }
}

/// 一维数组按列写出，长度必须一致
fn series_to_csv(dict: &Dict, output_path: &Path) -> Result<()> {
    let columns: Vec<(&str, Vec<f64>)> = dict
        .series()
        .map(|(label, array)| (label, array.iter().copied().collect()))
        .collect();
    let rows = columns.first().map_or(0, |(_, values)| values.len());
    if let Some((label, values)) = columns.iter().find(|(_, values)| values.len() != rows) {
        return Err(QrefineError::InvalidArgument(format!(
            "Cannot export '{}' with {} values next to columns with {} rows.",
            label,
            values.len(),
            rows
        )));
    }

    let mut wtr = csv::Writer::from_path(output_path)?;
    wtr.write_record(columns.iter().map(|(label, _)| *label))?;
    for row in 0..rows {
        wtr.write_record(columns.iter().map(|(_, values)| format!("{:.6}", values[row])))?;
    }
    wtr.flush().map_err(|e| QrefineError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 零维数组和标量按 `label,value` 写出
fn values_to_csv(dict: &Dict, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for (label, value) in dict.iter() {
        let value = match value {
            Value::Scalar(value) => *value,
            Value::Array(array) if array.ndim() == 0 => array.sum(),
            _ => continue,
        };
        wtr.serialize(LabeledValue { label, value })?;
    }
    wtr.flush().map_err(|e| QrefineError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
