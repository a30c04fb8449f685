//! # 图表生成
//!
//! 使用 `plotters` 绘制精炼结果的折线图（例如 DOS）。
//!
//! ## 功能
//! - 第一列作为横轴，其余一维数组各画一条线
//! - 向下的自旋分量取负值画在横轴下方
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/dos.rs` 调用
//! - 使用 `refinery::Dict`
//! - 使用 `plotters` 渲染图表

use crate::error::{QrefineError, Result};
use crate::refinery::dos::flip_down_component;
use crate::refinery::Dict;

use plotters::prelude::*;
use std::path::Path;

/// 图表参数
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub width: u32,
    pub height: u32,
}

impl PlotOptions {
    /// DOS 图的默认参数
    pub fn dos(title: impl Into<String>) -> Self {
        PlotOptions {
            title: title.into(),
            x_label: "Energy (eV)".to_string(),
            y_label: "DOS (1/eV)".to_string(),
            width: 1200,
            height: 800,
        }
    }
}

/// 一条曲线
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub y: Vec<f64>,
}

/// 把字典转换为横轴和曲线
pub fn series_from_dict(dict: &Dict) -> Result<(Vec<f64>, Vec<Series>)> {
    let mut columns = dict.series();
    let Some((_, x)) = columns.next() else {
        return Err(QrefineError::NoData("Nothing to plot.".to_string()));
    };
    let x: Vec<f64> = x.iter().copied().collect();
    let series = columns
        .map(|(label, values)| {
            let sign = if flip_down_component(label) { -1.0 } else { 1.0 };
            Series {
                label: label.to_string(),
                y: values.iter().map(|v| sign * v).collect(),
            }
        })
        .collect();
    Ok((x, series))
}

/// 生成折线图，扩展名为 `.svg` 时输出 SVG，否则输出 PNG
pub fn generate_line_plot(dict: &Dict, output_path: &Path, options: &PlotOptions) -> Result<()> {
    let (x, series) = series_from_dict(dict)?;
    let use_svg = output_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if use_svg {
        let root = SVGBackend::new(output_path, (options.width, options.height)).into_drawing_area();
        draw_line_chart(&root, &x, &series, options)?;
        root.present()
            .map_err(|e| QrefineError::PlotError(e.to_string()))?;
    } else {
        let root =
            BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
        draw_line_chart(&root, &x, &series, options)?;
        root.present()
            .map_err(|e| QrefineError::PlotError(e.to_string()))?;
    }
    Ok(())
}

/// 横轴和纵轴范围，纵轴留出 5% 的边距
fn ranges(x: &[f64], series: &[Series]) -> ((f64, f64), (f64, f64)) {
    let (x_min, x_max) = bounds(x.iter().copied());
    let (y_min, y_max) = bounds(series.iter().flat_map(|s| s.y.iter().copied()));

    let x_range = if x_min < x_max { (x_min, x_max) } else { (x_min - 1.0, x_min + 1.0) };
    let (y_min, y_max) = if y_min.is_finite() { (y_min.min(0.0), y_max.max(0.0)) } else { (0.0, 1.0) };
    let margin = ((y_max - y_min) * 0.05).max(1e-6);
    (x_range, (y_min - margin, y_max + margin))
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn draw_line_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    x: &[f64],
    series: &[Series],
    options: &PlotOptions,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| QrefineError::PlotError(format!("{:?}", e)))?;

    let ((x_min, x_max), (y_min, y_max)) = ranges(x, series);

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| QrefineError::PlotError(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc(options.x_label.as_str())
        .y_desc(options.y_label.as_str())
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| QrefineError::PlotError(format!("{:?}", e)))?;

    for (index, line) in series.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        chart
            .draw_series(LineSeries::new(
                x.iter().copied().zip(line.y.iter().copied()),
                color.stroke_width(2),
            ))
            .map_err(|e| QrefineError::PlotError(format!("{:?}", e)))?
            .label(line.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| QrefineError::PlotError(format!("{:?}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_series_from_dict_flips_down_spin() {
        let mut dict = Dict::new();
        dict.insert("energies", arr1(&[-1.0, 0.0, 1.0]).into_dyn());
        dict.insert("up", arr1(&[1.0, 2.0, 3.0]).into_dyn());
        dict.insert("down", arr1(&[1.0, 2.0, 3.0]).into_dyn());
        dict.insert("fermi_energy", 0.2);

        let (x, series) = series_from_dict(&dict).unwrap();
        assert_eq!(x, vec![-1.0, 0.0, 1.0]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].y, vec![1.0, 2.0, 3.0]);
        assert_eq!(series[1].label, "down");
        assert_eq!(series[1].y, vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_ranges_include_zero() {
        let series = vec![Series {
            label: "total".to_string(),
            y: vec![1.0, 3.0],
        }];
        let ((x_min, x_max), (y_min, y_max)) = ranges(&[0.0, 2.0], &series);
        assert_eq!((x_min, x_max), (0.0, 2.0));
        assert!(y_min < 0.0 && y_min > -0.2);
        assert!(y_max > 3.0);
    }

    #[test]
    fn test_empty_dict_cannot_be_plotted() {
        assert!(series_from_dict(&Dict::new()).is_err());
    }
}
