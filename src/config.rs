//! # 运行配置
//!
//! 配置是显式传递的值：命令行参数（含环境变量 `QREFINE_VERBOSE`）
//! 在 `main` 中转换为 [`OutputConfig`]，再交给错误输出边界。
//!
//! ## 依赖关系
//! - 被 `main.rs` 和 `utils/output.rs` 使用

/// 错误输出的详细程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorVerbosity {
    /// 只显示消息
    #[default]
    Message,
    /// 同时显示错误来源链
    Chain,
}

/// 终端输出配置
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub verbosity: ErrorVerbosity,
}

impl OutputConfig {
    pub fn new(verbose: bool) -> Self {
        OutputConfig {
            verbosity: if verbose {
                ErrorVerbosity::Chain
            } else {
                ErrorVerbosity::Message
            },
        }
    }

    /// 非用户错误（程序 bug）总是显示完整来源链
    pub fn show_chain(&self, user_error: bool) -> bool {
        self.verbosity == ErrorVerbosity::Chain || !user_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_shown_for_internal_errors() {
        let quiet = OutputConfig::new(false);
        assert!(!quiet.show_chain(true));
        assert!(quiet.show_chain(false));
        assert!(OutputConfig::new(true).show_chain(true));
    }
}
