//! # 统一错误处理模块
//!
//! 定义 qrefine 的所有错误类型，使用 `thiserror` 派生。
//!
//! - `SelectionError`: 选择字符串解析与索引解析的错误（核心层）
//! - `QrefineError`: 文件读写、数据缺失等应用层错误，包装 `SelectionError`
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// 选择解析错误
///
/// 除 `ShapeMismatch` 和 `Internal` 外均为用户输入错误，
/// 前端可以只显示消息而不显示调用链。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    // ─────────────────────────────────────────────────────────────
    // 语法错误
    // ─────────────────────────────────────────────────────────────
    #[error("Error when parsing the selection string\n  {selection}\n  {}^\n{message}", caret(.position))]
    Syntax {
        selection: String,
        position: usize,
        message: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 用法错误
    // ─────────────────────────────────────────────────────────────
    #[error("Could not read \"{key}\". {suggestion}Please check the spelling and capitalization. Valid choices are: {}.", .valid.join(", "))]
    UnknownKey {
        key: String,
        suggestion: String,
        valid: Vec<String>,
    },

    #[error("The key \"{key}\" is defined for more than one axis ({}); the selection would be ambiguous.", join_axes(.axes))]
    AmbiguousKey { key: String, axes: Vec<usize> },

    #[error("{0}")]
    IncorrectUsage(String),

    // ─────────────────────────────────────────────────────────────
    // 内部错误（调用方 bug）
    // ─────────────────────────────────────────────────────────────
    #[error("Index {index} is out of bounds for axis {axis} with length {len}")]
    ShapeMismatch { axis: usize, index: usize, len: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn caret(position: &usize) -> String {
    " ".repeat(*position)
}

fn join_axes(axes: &[usize]) -> String {
    axes.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SelectionError {
    /// 是否为可以直接展示给用户的错误
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            SelectionError::ShapeMismatch { .. } | SelectionError::Internal(_)
        )
    }
}

/// qrefine 统一错误类型
#[derive(Error, Debug)]
pub enum QrefineError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("Failed to read array '{name}' from {path}")]
    NpyReadError {
        name: String,
        path: String,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error(transparent)]
    Selection(#[from] SelectionError),

    // ─────────────────────────────────────────────────────────────
    // 数据错误
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    NoData(String),

    #[error("Array '{name}' has shape {shape:?}, expected {expected}")]
    InvalidShape {
        name: String,
        shape: Vec<usize>,
        expected: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 输出错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Plot error: {0}")]
    PlotError(String),
}

impl QrefineError {
    /// 是否为用户输入错误（而非程序 bug）
    pub fn is_user_error(&self) -> bool {
        match self {
            QrefineError::Selection(e) => e.is_user_error(),
            _ => true,
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, QrefineError>;

/// 选择解析 Result 类型别名
pub type SelectResult<T> = std::result::Result<T, SelectionError>;
