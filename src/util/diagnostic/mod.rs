//! 统一诊断系统
//!
//! 提供错误码注册表、诊断构建与渲染
//!
//! # 模块结构
//!
//! - [`error`] - 诊断数据结构 (Diagnostic, Severity)
//! - [`codes`] - 错误码注册表与 DiagnosticBuilder
//! - [`emitter`] - 文本 / JSON 渲染
//! - [`suggest`] - 拼写建议
//! - [`check`] - `mixfix check` 命令
//!
//! # 示例
//!
//! ```ignore
//! use mixfix::util::diagnostic::{TextEmitter, Diagnostic};
//!
//! let emitter = TextEmitter::new();
//! println!("{}", emitter.render_with_source(&diagnostic, Some(&source_file)));
//! ```

pub mod check;
pub mod codes;
pub mod emitter;
pub mod error;
pub mod suggest;

// 重新导出
pub use codes::{DiagnosticBuilder, ErrorCategory, ErrorCodeDefinition};
pub use emitter::{EmitterConfig, JsonEmitter, TextEmitter};
pub use error::{Diagnostic, Severity};

/// 可转换为诊断的错误
///
/// 声明期错误 (`RegistryError`) 与解析期错误 (`ParseError`) 都实现此 trait，
/// 由 CLI 与宿主统一渲染。
pub trait ToDiagnostic {
    fn to_diagnostic(&self) -> Diagnostic;
}
