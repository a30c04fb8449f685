//! # qrefine - 基于选择字符串的 VASP 数据精炼
//!
//! 用户用一个简短的选择字符串（如 `"Sr(p), Ti(d) - O(p)"`）描述想要的数据，
//! 本库把它解析为选择树，再根据映射把每条选择转换为数组索引并求和。
//!
//! ## 模块
//! - `select` - 选择字符串解析为树
//! - `index` - 选择到数组索引的映射与约化
//! - `refinery` - 投影、态密度和受力的精炼
//! - `raw`, `parsers`, `models` - 原始数组与晶体结构
//! - `export`, `plot` - CSV 导出和绘图
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── select/    (选择树)
//!   ├── index/     (索引解析，依赖 select/, suggest.rs)
//!   ├── refinery/  (依赖 index/, raw/, models/)
//!   ├── raw/       (依赖 parsers/, models/)
//!   ├── export.rs, plot.rs
//!   ├── utils/     (终端输出)
//!   ├── config.rs
//!   └── error.rs
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod index;
pub mod models;
pub mod parsers;
pub mod plot;
pub mod raw;
pub mod refinery;
pub mod select;
pub mod suggest;
pub mod utils;
